//! Thread-safe in-memory [`SessionStore`] implementation.

// self
use crate::{
	_prelude::*,
	auth::SessionId,
	store::{Session, SessionStore, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<SessionId, Session>>>;

/// Thread-safe storage backend that keeps sessions in-process.
///
/// Sessions vanish when the process exits.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored sessions, expired ones included until evicted.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Whether the store holds no sessions.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Evicts every session expired at `now`, returning how many were removed.
	pub fn purge_expired(&self, now: OffsetDateTime) -> usize {
		let mut guard = self.0.write();
		let before = guard.len();

		guard.retain(|_, session| !session.is_expired_at(now));

		before - guard.len()
	}

	fn load_now(map: StoreMap, id: SessionId, now: OffsetDateTime) -> Option<Session> {
		{
			let guard = map.read();

			match guard.get(&id) {
				Some(session) if !session.is_expired_at(now) => return Some(session.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		map.write().remove(&id);

		None
	}

	fn save_now(map: StoreMap, session: Session) {
		map.write().insert(session.id.clone(), session);
	}

	fn destroy_now(map: StoreMap, id: SessionId) -> bool {
		map.write().remove(&id).is_some()
	}
}
impl SessionStore for MemoryStore {
	fn load<'a>(&'a self, id: &'a SessionId) -> StoreFuture<'a, Option<Session>> {
		let map = self.0.clone();
		let id = id.to_owned();

		Box::pin(async move { Ok(Self::load_now(map, id, OffsetDateTime::now_utc())) })
	}

	fn save(&self, session: Session) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			Self::save_now(map, session);

			Ok(())
		})
	}

	fn destroy<'a>(&'a self, id: &'a SessionId) -> StoreFuture<'a, bool> {
		let map = self.0.clone();
		let id = id.to_owned();

		Box::pin(async move { Ok(Self::destroy_now(map, id)) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn purge_expired_keeps_live_sessions() {
		let store = MemoryStore::default();
		let now = OffsetDateTime::now_utc();
		let live = Session::new_at(now, Duration::hours(1));
		let stale = Session::new_at(now - Duration::hours(2), Duration::hours(1));

		MemoryStore::save_now(store.0.clone(), live.clone());
		MemoryStore::save_now(store.0.clone(), stale);

		assert_eq!(store.purge_expired(now), 1);
		assert_eq!(store.len(), 1);
		assert!(MemoryStore::load_now(store.0.clone(), live.id, now).is_some());
	}
}
