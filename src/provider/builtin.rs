//! Descriptors and strategies for the providers the relay ships with.

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, ScopeSet},
	error::ConfigError,
	provider::{
		ClientAuthMethod, FacebookStrategy, GitHubStrategy, OidcStrategy, ProviderDescriptor,
		ProviderQuirks, ProviderStrategy,
	},
};

/// Identity providers with built-in descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinProvider {
	/// Google (OpenID Connect userinfo).
	Google,
	/// GitHub (REST `user` + `user/emails`).
	GitHub,
	/// Facebook (Graph API `me`).
	Facebook,
}
impl BuiltinProvider {
	/// Every built-in provider, in the order the entry page lists them.
	pub const ALL: [Self; 3] = [Self::Google, Self::GitHub, Self::Facebook];

	/// Returns the route segment used under `/auth/`.
	pub const fn as_str(self) -> &'static str {
		match self {
			BuiltinProvider::Google => "google",
			BuiltinProvider::GitHub => "github",
			BuiltinProvider::Facebook => "facebook",
		}
	}

	/// Returns the human-readable provider name.
	pub const fn label(self) -> &'static str {
		match self {
			BuiltinProvider::Google => "Google",
			BuiltinProvider::GitHub => "GitHub",
			BuiltinProvider::Facebook => "Facebook",
		}
	}

	/// Builds the production descriptor for the provider.
	pub fn descriptor(self) -> Result<ProviderDescriptor, ConfigError> {
		let builder = ProviderDescriptor::builder(ProviderId::new(self.as_str())?).label(self.label());
		let builder = match self {
			BuiltinProvider::Google => builder
				.authorization_endpoint(endpoint("https://accounts.google.com/o/oauth2/v2/auth")?)
				.token_endpoint(endpoint("https://oauth2.googleapis.com/token")?)
				.profile_endpoint(endpoint("https://www.googleapis.com/oauth2/v3/userinfo")?)
				.default_scope(ScopeSet::new(["profile", "email"])?),
			BuiltinProvider::GitHub => builder
				.authorization_endpoint(endpoint("https://github.com/login/oauth/authorize")?)
				.token_endpoint(endpoint("https://github.com/login/oauth/access_token")?)
				.profile_endpoint(endpoint("https://api.github.com/user")?)
				.email_endpoint(endpoint("https://api.github.com/user/emails")?)
				.default_scope(ScopeSet::new(["user:email"])?),
			BuiltinProvider::Facebook => builder
				.authorization_endpoint(endpoint("https://www.facebook.com/v18.0/dialog/oauth")?)
				.token_endpoint(endpoint("https://graph.facebook.com/v18.0/oauth/access_token")?)
				.profile_endpoint(endpoint(
					"https://graph.facebook.com/v18.0/me?fields=id,name,email",
				)?)
				.preferred_client_auth_method(ClientAuthMethod::ClientSecretPost)
				.quirks(ProviderQuirks { scope_delimiter: ',' }),
		};

		Ok(builder.build()?)
	}

	/// Returns the profile strategy for the provider.
	pub fn strategy(self) -> Arc<dyn ProviderStrategy> {
		match self {
			BuiltinProvider::Google => Arc::new(OidcStrategy),
			BuiltinProvider::GitHub => Arc::new(GitHubStrategy),
			BuiltinProvider::Facebook => Arc::new(FacebookStrategy),
		}
	}
}
impl Display for BuiltinProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

fn endpoint(value: &str) -> Result<Url, ConfigError> {
	Url::parse(value).map_err(|source| ConfigError::InvalidEndpoint { source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn builtin_descriptors_validate() {
		for provider in BuiltinProvider::ALL {
			let descriptor = provider.descriptor().expect("Built-in descriptor should validate.");

			assert_eq!(descriptor.id.as_ref(), provider.as_str());
			assert_eq!(descriptor.label, provider.label());
			assert_eq!(descriptor.endpoints.authorization.scheme(), "https");
		}
	}

	#[test]
	fn builtin_scopes_match_login_entry_contract() {
		let google = BuiltinProvider::Google.descriptor().expect("Google descriptor should build.");
		let github = BuiltinProvider::GitHub.descriptor().expect("GitHub descriptor should build.");
		let facebook =
			BuiltinProvider::Facebook.descriptor().expect("Facebook descriptor should build.");

		assert_eq!(google.scope_param().as_deref(), Some("email profile"));
		assert_eq!(github.scope_param().as_deref(), Some("user:email"));
		assert_eq!(facebook.scope_param(), None);
		assert!(github.endpoints.email.is_some());
		assert_eq!(facebook.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost);
	}
}
