//! Typed identity established after a successful provider callback.

// self
use crate::{
	_prelude::*,
	auth::{ExternalId, IdentifierError, ProviderId},
};

/// Errors raised while turning provider profile fields into an [`Identity`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentityError {
	/// Provider-assigned user identifier failed validation.
	#[error("Profile carries an invalid user identifier: {0}")]
	ExternalId(#[from] IdentifierError),
	/// Email field is present but not an address.
	#[error("Profile carries a malformed email address: {email}.")]
	MalformedEmail {
		/// Offending value.
		email: String,
	},
}

/// Authenticated end-user identity stored in the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	/// Provider that authenticated the user.
	pub provider: ProviderId,
	/// Provider-assigned user identifier.
	pub external_id: ExternalId,
	/// Human-readable name rendered on the profile page.
	pub display_name: String,
	/// Email address, when the provider shared one.
	pub email: Option<String>,
}

/// Raw identity fields lifted from a provider profile, prior to validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityDraft {
	/// Provider-assigned user identifier.
	pub external_id: String,
	/// Full name, when shared.
	pub name: Option<String>,
	/// Login or handle, when the provider has one.
	pub username: Option<String>,
	/// Email address, when shared.
	pub email: Option<String>,
}
impl IdentityDraft {
	/// Creates a draft for the provided user identifier.
	pub fn new(external_id: impl Into<String>) -> Self {
		Self { external_id: external_id.into(), ..Default::default() }
	}

	/// Sets the full name.
	pub fn name(mut self, name: Option<String>) -> Self {
		self.name = name;

		self
	}

	/// Sets the login or handle.
	pub fn username(mut self, username: Option<String>) -> Self {
		self.username = username;

		self
	}

	/// Sets the email address.
	pub fn email(mut self, email: Option<String>) -> Self {
		self.email = email;

		self
	}

	/// Validates the draft and resolves the display name.
	///
	/// Blank fields count as absent. The display name falls back from the full name to the
	/// username, then the email, then the external identifier, so it is never empty.
	pub fn finish(self, provider: ProviderId) -> Result<Identity, IdentityError> {
		let external_id = ExternalId::new(self.external_id.trim())?;
		let email = non_blank(self.email);

		if let Some(address) = email.as_deref().filter(|address| !is_plausible_email(address)) {
			return Err(IdentityError::MalformedEmail { email: address.to_owned() });
		}

		let display_name = non_blank(self.name)
			.or_else(|| non_blank(self.username))
			.or_else(|| email.clone())
			.unwrap_or_else(|| external_id.to_string());

		Ok(Identity { provider, external_id, display_name, email })
	}
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn is_plausible_email(value: &str) -> bool {
	match value.split_once('@') {
		Some((local, domain)) =>
			!local.is_empty() && !domain.is_empty() && !value.chars().any(char::is_whitespace),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn provider() -> ProviderId {
		ProviderId::new("github").expect("Provider fixture should be valid.")
	}

	#[test]
	fn display_name_prefers_full_name() {
		let identity = IdentityDraft::new("42")
			.name(Some("Ada Lovelace".into()))
			.username(Some("ada".into()))
			.email(Some("ada@example.com".into()))
			.finish(provider())
			.expect("Draft should validate.");

		assert_eq!(identity.display_name, "Ada Lovelace");
		assert_eq!(identity.external_id.as_ref(), "42");
		assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
	}

	#[test]
	fn display_name_falls_back_in_order() {
		let by_username = IdentityDraft::new("42")
			.name(Some("   ".into()))
			.username(Some("ada".into()))
			.finish(provider())
			.expect("Draft should validate.");

		assert_eq!(by_username.display_name, "ada");

		let by_email = IdentityDraft::new("42")
			.email(Some("ada@example.com".into()))
			.finish(provider())
			.expect("Draft should validate.");

		assert_eq!(by_email.display_name, "ada@example.com");

		let by_id = IdentityDraft::new("42").finish(provider()).expect("Draft should validate.");

		assert_eq!(by_id.display_name, "42");
	}

	#[test]
	fn rejects_invalid_ids_and_emails() {
		assert!(matches!(
			IdentityDraft::new("").finish(provider()),
			Err(IdentityError::ExternalId(_))
		));
		assert!(matches!(
			IdentityDraft::new("42").email(Some("not-an-email".into())).finish(provider()),
			Err(IdentityError::MalformedEmail { .. })
		));
	}
}
