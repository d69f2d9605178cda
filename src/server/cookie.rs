//! Signed session cookie handling.

// crates.io
use axum::http::{HeaderMap, header::COOKIE};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{_prelude::*, auth::SessionId, error::ConfigError};

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "gatehouse.sid";

/// Signs, verifies, and formats the session cookie.
///
/// The cookie value is `{session_id}.{signature}`, where the signature is HMAC-SHA256 of the
/// identifier under the session secret, base64url-encoded without padding. Cookies that fail
/// verification are treated as absent.
#[derive(Clone)]
pub struct CookiePolicy {
	mac: HmacSha256,
	secure: bool,
}
impl CookiePolicy {
	/// Creates a policy keyed by `secret`; `secure` adds the `Secure` attribute.
	pub fn new(secret: &str, secure: bool) -> Result<Self, ConfigError> {
		if secret.trim().is_empty() {
			return Err(ConfigError::MissingSessionSecret);
		}

		let mac = HmacSha256::new_from_slice(secret.as_bytes())
			.map_err(|_| ConfigError::MissingSessionSecret)?;

		Ok(Self { mac, secure })
	}

	/// Whether issued cookies carry `Secure`.
	pub fn is_secure(&self) -> bool {
		self.secure
	}

	/// Signed cookie value for `id`.
	pub fn sign(&self, id: &SessionId) -> String {
		let mut mac = self.mac.clone();

		mac.update(id.as_bytes());

		format!("{id}.{}", URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
	}

	/// Verifies a signed cookie value and returns the identifier it carries.
	pub fn verify(&self, value: &str) -> Option<SessionId> {
		let (id, signature) = value.rsplit_once('.')?;
		let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
		let mut mac = self.mac.clone();

		mac.update(id.as_bytes());
		mac.verify_slice(&signature).ok()?;

		SessionId::new(id).ok()
	}

	/// Session identifier from the request's `Cookie` headers, if a valid one is present.
	pub fn session_id(&self, headers: &HeaderMap) -> Option<SessionId> {
		headers
			.get_all(COOKIE)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.flat_map(|value| value.split(';'))
			.filter_map(|pair| pair.trim().split_once('='))
			.filter(|(name, _)| *name == SESSION_COOKIE)
			.find_map(|(_, value)| self.verify(value))
	}

	/// `Set-Cookie` value binding the browser to `id` for `max_age`.
	pub fn issue(&self, id: &SessionId, max_age: Duration) -> String {
		format!(
			"{SESSION_COOKIE}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax{}",
			self.sign(id),
			max_age.whole_seconds().max(0),
			self.secure_suffix(),
		)
	}

	/// `Set-Cookie` value removing the session cookie.
	pub fn clear(&self) -> String {
		let secure = self.secure_suffix();

		format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax{secure}")
	}

	fn secure_suffix(&self) -> &'static str {
		if self.secure { "; Secure" } else { "" }
	}
}
impl Debug for CookiePolicy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CookiePolicy").field("secure", &self.secure).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use axum::http::HeaderValue;
	// self
	use super::*;

	fn policy(secure: bool) -> CookiePolicy {
		CookiePolicy::new("test-secret", secure).expect("Policy should build.")
	}

	#[test]
	fn signed_values_verify_and_tampering_is_rejected() {
		let policy = policy(false);
		let id = SessionId::generate();
		let signed = policy.sign(&id);

		assert_eq!(policy.verify(&signed), Some(id.clone()));
		assert_eq!(policy.verify(id.as_ref()), None);
		assert_eq!(policy.verify(&format!("{signed}x")), None);

		let other = CookiePolicy::new("other-secret", false).expect("Policy should build.");

		assert_eq!(other.verify(&signed), None);

		let (_, signature) = signed.rsplit_once('.').expect("Signed value should carry a signature.");
		let forged = format!("{}.{signature}", SessionId::generate());

		assert_eq!(policy.verify(&forged), None);
	}

	#[test]
	fn session_id_is_read_among_other_cookies() {
		let policy = policy(false);
		let id = SessionId::generate();
		let mut headers = HeaderMap::new();
		let value = format!("theme=dark; {SESSION_COOKIE}={}; lang=en", policy.sign(&id));

		headers
			.insert(COOKIE, HeaderValue::from_str(&value).expect("Cookie header should encode."));

		assert_eq!(policy.session_id(&headers), Some(id));
	}

	#[test]
	fn attributes_follow_production_flag() {
		let id = SessionId::generate();
		let dev = policy(false).issue(&id, Duration::hours(1));
		let prod = policy(true).issue(&id, Duration::hours(1));

		assert!(dev.starts_with("gatehouse.sid="));
		assert!(dev.contains("; Path=/; Max-Age=3600; HttpOnly; SameSite=Lax"));
		assert!(!dev.contains("Secure"));
		assert!(prod.ends_with("; Secure"));
		assert!(policy(true).clear().contains("Max-Age=0"));
	}

	#[test]
	fn blank_secret_is_rejected() {
		assert!(matches!(CookiePolicy::new(" ", false), Err(ConfigError::MissingSessionSecret)));
	}
}
