//! Provider descriptor data structures shared by the relay and its flows.
//!
//! The module exposes validated metadata and supporting builder utilities so providers can
//! describe their endpoints in a transport-agnostic way.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, ScopeSet},
};

/// Preferred client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the browser is redirected to at login entry.
	pub authorization: Url,
	/// Token endpoint used for the authorization code exchange.
	pub token: Url,
	/// Endpoint returning the authenticated user's profile.
	pub profile: Url,
	/// Optional endpoint listing the user's email addresses when the profile omits one.
	pub email: Option<Url>,
}

/// Immutable provider descriptor consumed by the relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier; doubles as the `/auth/{provider}` route segment.
	pub id: ProviderId,
	/// Human-readable provider name used on the entry page.
	pub label: String,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Scope requested at login entry. Empty means the provider's default scope.
	pub default_scope: ScopeSet,
	/// Preferred client authentication mechanism.
	pub preferred_client_auth_method: ClientAuthMethod,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Formats the default scope using the provider's delimiter.
	pub fn scope_param(&self) -> Option<String> {
		self.default_scope.join(self.quirks.scope_delimiter)
	}
}
