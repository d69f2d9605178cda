//! Relay-level error types shared across login flows, providers, and stores.

// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Provider profile could not be turned into an identity.
	#[error(transparent)]
	Profile(#[from] crate::provider::ProfileError),

	/// Requested provider is not registered with the relay.
	#[error("Provider `{provider}` is not registered.")]
	UnknownProvider {
		/// Provider name taken from the request path.
		provider: String,
	},
	/// Provider redirected back with an OAuth error instead of a code.
	#[error("Provider denied the authorization request: {reason}.")]
	AccessDenied {
		/// Provider-supplied error code or description.
		reason: String,
	},
	/// Callback carried no authorization code.
	#[error("Callback is missing the authorization code.")]
	MissingCode,
	/// Callback `state` does not match the one issued at login entry.
	#[error("Authorization state mismatch.")]
	StateMismatch,
	/// Provider rejected the grant (e.g., bad or reused code).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or relay-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or relay-supplied reason string.
		reason: String,
	},
}

/// Configuration and validation failures raised by the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Response header value could not be encoded.
	#[error(transparent)]
	HeaderValue(#[from] oauth2::http::header::InvalidHeaderValue),
	/// Provider descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Callback URL cannot be derived from the base URL.
	#[error("Callback URL is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Scope list cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Session signing secret is empty.
	#[error("Session secret must not be empty.")]
	MissingSessionSecret,
	/// Provider credentials were only partially configured.
	#[error("Provider `{provider}` requires both a client id and a client secret.")]
	IncompleteCredentials {
		/// Provider name.
		provider: &'static str,
	},
	/// Session lifetime is zero or unreasonably long.
	#[error("Session TTL must be between 1 and {max} seconds, got {secs}.")]
	SessionTtl {
		/// Requested lifetime in seconds.
		secs: u64,
		/// Largest accepted lifetime in seconds.
		max: u64,
	},
	/// Palette size falls outside the range supported by the quantizer.
	#[error("Palette size must be between 2 and 254, got {size}.")]
	PaletteSize {
		/// Requested palette size.
		size: u8,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or relay-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Profile endpoint answered with a non-success status.
	#[error("Profile endpoint returned HTTP {status}.")]
	ProfileEndpoint {
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport or while serving.
	#[error("I/O error occurred: {0}.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_converts_with_source() {
		let store_error = crate::store::StoreError::Backend { message: "lock poisoned".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("lock poisoned"));

		let source = StdError::source(&error)
			.expect("Relay error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn unknown_provider_names_the_provider() {
		let error = Error::UnknownProvider { provider: "myspace".into() };

		assert_eq!(error.to_string(), "Provider `myspace` is not registered.");
	}
}
