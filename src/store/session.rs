//! Browser session records and their login state machine.

// self
use crate::{
	_prelude::*,
	auth::{Identity, ProviderId, SessionId},
};

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL: Duration = Duration::days(1);
/// Longest a session may live while it only carries an unfinished login.
pub const PENDING_LOGIN_TTL: Duration = Duration::minutes(10);

/// Login attempt issued at `/auth/{provider}` and awaiting its callback.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
	/// Provider the browser was redirected to.
	pub provider: ProviderId,
	/// Anti-forgery `state` value sent with the authorization request.
	pub state: String,
}
impl Debug for PendingLogin {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingLogin")
			.field("provider", &self.provider)
			.field("state", &"<redacted>")
			.finish()
	}
}

/// Authentication state of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
	/// No identity yet; may carry an in-flight login.
	Anonymous {
		/// Login awaiting its provider callback.
		pending: Option<PendingLogin>,
	},
	/// A provider callback succeeded for this session.
	Authenticated(Identity),
}

/// Server-side session keyed by the cookie-borne [`SessionId`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
	/// Identifier carried in the signed session cookie.
	pub id: SessionId,
	/// Anonymous or authenticated state.
	pub state: SessionState,
	/// Creation instant.
	pub created_at: OffsetDateTime,
	/// Instant after which the session counts as absent.
	pub expires_at: OffsetDateTime,
}
impl Session {
	/// Creates an anonymous session living for `ttl` from now.
	pub fn new(ttl: Duration) -> Self {
		Self::new_at(OffsetDateTime::now_utc(), ttl)
	}

	/// Creates an anonymous session living for `ttl` from `now`.
	pub fn new_at(now: OffsetDateTime, ttl: Duration) -> Self {
		Self {
			id: SessionId::generate(),
			state: SessionState::Anonymous { pending: None },
			created_at: now,
			expires_at: now + ttl,
		}
	}

	/// Returns the authenticated identity, if any.
	pub fn identity(&self) -> Option<&Identity> {
		match &self.state {
			SessionState::Authenticated(identity) => Some(identity),
			SessionState::Anonymous { .. } => None,
		}
	}

	/// Returns the in-flight login, if any.
	pub fn pending(&self) -> Option<&PendingLogin> {
		match &self.state {
			SessionState::Anonymous { pending } => pending.as_ref(),
			SessionState::Authenticated(_) => None,
		}
	}

	/// Whether the session holds an identity.
	pub fn is_authenticated(&self) -> bool {
		self.identity().is_some()
	}

	/// Whether the session has expired at `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}

	/// Records a login attempt. Starting a login drops any previous identity.
	///
	/// The session expires within [`PENDING_LOGIN_TTL`] unless the callback authenticates it.
	pub fn begin_login(&mut self, pending: PendingLogin) {
		self.begin_login_at(OffsetDateTime::now_utc(), pending);
	}

	/// Records a login attempt started at `now`.
	pub fn begin_login_at(&mut self, now: OffsetDateTime, pending: PendingLogin) {
		self.state = SessionState::Anonymous { pending: Some(pending) };
		self.expires_at = self.expires_at.min(now + PENDING_LOGIN_TTL);
	}

	/// Forgets the in-flight login, leaving the session anonymous.
	pub fn abandon_login(&mut self) {
		self.state = SessionState::Anonymous { pending: None };
	}

	/// Consumes the session and returns an authenticated one under a fresh identifier.
	///
	/// The caller must destroy the previous identifier so a cookie captured before login cannot
	/// be replayed afterwards.
	pub fn authenticate(self, identity: Identity, ttl: Duration) -> Self {
		let now = OffsetDateTime::now_utc();

		Self {
			id: SessionId::generate(),
			state: SessionState::Authenticated(identity),
			created_at: now,
			expires_at: now + ttl,
		}
	}
}
