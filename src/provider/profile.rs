//! Profile payload shapes for the built-in providers and the strategies that read them.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{IdentityDraft, IdentityError},
	provider::ProviderStrategy,
};

/// Failures raised while mapping a provider profile into an identity.
#[derive(Debug, ThisError)]
pub enum ProfileError {
	/// Payload was not the JSON shape the provider documents.
	#[error("Profile payload is malformed at `{}`.", .source.path())]
	Malformed {
		/// Structured parsing failure, including the JSON path of the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
	/// Payload parsed but carried unusable identity fields.
	#[error(transparent)]
	Identity(#[from] IdentityError),
}

/// Strategy for OpenID Connect `userinfo` payloads (Google and other OIDC providers).
#[derive(Debug, Default)]
pub struct OidcStrategy;
impl ProviderStrategy for OidcStrategy {
	fn identity_from_profile(&self, body: &[u8]) -> Result<IdentityDraft, ProfileError> {
		let profile: OidcUserInfo = parse(body)?;

		Ok(IdentityDraft::new(profile.sub)
			.name(profile.name)
			.username(profile.preferred_username)
			.email(profile.email))
	}
}

/// Strategy for the GitHub REST `user` payload and `user/emails` listing.
#[derive(Debug, Default)]
pub struct GitHubStrategy;
impl ProviderStrategy for GitHubStrategy {
	fn identity_from_profile(&self, body: &[u8]) -> Result<IdentityDraft, ProfileError> {
		let profile: GitHubUser = parse(body)?;

		Ok(IdentityDraft::new(profile.id.to_string())
			.name(profile.name)
			.username(Some(profile.login))
			.email(profile.email))
	}

	fn primary_email(&self, body: &[u8]) -> Result<Option<String>, ProfileError> {
		let emails: Vec<GitHubEmail> = parse(body)?;
		let pick = emails
			.iter()
			.find(|entry| entry.primary && entry.verified)
			.or_else(|| emails.iter().find(|entry| entry.verified));

		Ok(pick.map(|entry| entry.email.clone()))
	}
}

/// Strategy for the Facebook Graph API `me` payload.
#[derive(Debug, Default)]
pub struct FacebookStrategy;
impl ProviderStrategy for FacebookStrategy {
	fn identity_from_profile(&self, body: &[u8]) -> Result<IdentityDraft, ProfileError> {
		let profile: FacebookMe = parse(body)?;

		Ok(IdentityDraft::new(profile.id).name(profile.name).email(profile.email))
	}
}

#[derive(Debug, Deserialize)]
struct OidcUserInfo {
	sub: String,
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	preferred_username: Option<String>,
	#[serde(default)]
	email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
	id: u64,
	login: String,
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
	email: String,
	#[serde(default)]
	primary: bool,
	#[serde(default)]
	verified: bool,
}

#[derive(Debug, Deserialize)]
struct FacebookMe {
	id: String,
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	email: Option<String>,
}

fn parse<T>(body: &[u8]) -> Result<T, ProfileError>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de).map_err(|source| ProfileError::Malformed { source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn oidc_userinfo_maps_standard_claims() {
		let body = br#"{"sub":"1090","name":"Ada Lovelace","email":"ada@example.com","email_verified":true}"#;
		let draft = OidcStrategy.identity_from_profile(body).expect("Userinfo should parse.");

		assert_eq!(draft.external_id, "1090");
		assert_eq!(draft.name.as_deref(), Some("Ada Lovelace"));
		assert_eq!(draft.email.as_deref(), Some("ada@example.com"));
	}

	#[test]
	fn github_user_tolerates_null_name_and_email() {
		let body = br#"{"id":583231,"login":"octocat","name":null,"email":null}"#;
		let draft = GitHubStrategy.identity_from_profile(body).expect("GitHub user should parse.");

		assert_eq!(draft.external_id, "583231");
		assert_eq!(draft.username.as_deref(), Some("octocat"));
		assert_eq!(draft.name, None);
		assert_eq!(draft.email, None);
	}

	#[test]
	fn github_primary_email_prefers_primary_verified() {
		let body = br#"[
			{"email":"old@example.com","primary":false,"verified":true},
			{"email":"main@example.com","primary":true,"verified":true},
			{"email":"spam@example.com","primary":false,"verified":false}
		]"#;
		let email = GitHubStrategy.primary_email(body).expect("Email listing should parse.");

		assert_eq!(email.as_deref(), Some("main@example.com"));

		let unverified = br#"[{"email":"x@example.com","primary":true,"verified":false}]"#;

		assert_eq!(GitHubStrategy.primary_email(unverified).expect("Listing should parse."), None);
	}

	#[test]
	fn facebook_me_maps_fields() {
		let body = br#"{"id":"10158","name":"Grace Hopper"}"#;
		let draft = FacebookStrategy.identity_from_profile(body).expect("Graph payload should parse.");

		assert_eq!(draft.external_id, "10158");
		assert_eq!(draft.name.as_deref(), Some("Grace Hopper"));
	}

	#[test]
	fn malformed_payload_reports_json_path() {
		let err = GitHubStrategy
			.identity_from_profile(br#"{"id":"not-a-number","login":"octocat"}"#)
			.expect_err("String id should be rejected.");

		match err {
			ProfileError::Malformed { source } => assert_eq!(source.path().to_string(), "id"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}
}
