//! Storage contracts and the built-in store implementation for browser sessions.

pub mod memory;
pub mod session;

pub use memory::MemoryStore;
pub use session::*;

// self
use crate::{_prelude::*, auth::SessionId};

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by session stores.
///
/// Implementations treat expired sessions as absent: [`SessionStore::load`] never returns a
/// session whose `expires_at` has passed.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Fetches the live session stored under `id`, if any.
	fn load<'a>(&'a self, id: &'a SessionId) -> StoreFuture<'a, Option<Session>>;

	/// Persists or replaces the session under its own identifier.
	fn save(&self, session: Session) -> StoreFuture<'_, ()>;

	/// Removes the session, reporting whether one was present.
	fn destroy<'a>(&'a self, id: &'a SessionId) -> StoreFuture<'a, bool>;
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
