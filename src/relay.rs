//! Login relay: the provider registry and the login/callback orchestration built on it.

pub mod login;

pub use login::*;

// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	error::ConfigError,
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{ReqwestTransportErrorMapper, TransportErrorMapper},
	provider::{BuiltinProvider, ProviderDescriptor, ProviderStrategy},
};

/// Relay specialized for the crate's default reqwest transport stack.
pub type ReqwestRelay = Relay<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Credentials and metadata for one registered provider.
#[derive(Clone)]
pub struct ProviderClient {
	/// Provider descriptor that defines endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// Strategy that reads the provider's profile payloads and classifies its errors.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret used at the token endpoint.
	pub client_secret: Option<String>,
}
impl ProviderClient {
	/// Creates a public client (no secret) for the descriptor.
	pub fn new(
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		client_id: impl Into<String>,
	) -> Self {
		Self { descriptor, strategy, client_id: client_id.into(), client_secret: None }
	}

	/// Creates a confidential client for one of the built-in providers.
	pub fn builtin(
		provider: BuiltinProvider,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, ConfigError> {
		Ok(Self::new(provider.descriptor()?, provider.strategy(), client_id)
			.with_client_secret(client_secret))
	}

	/// Sets or replaces the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}
}
impl Debug for ProviderClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderClient")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.finish()
	}
}

/// Coordinates provider logins for every registered provider.
///
/// The relay owns the HTTP client and the provider registry so request handlers only deal with
/// sessions and redirects. Callback URLs are derived from the public base URL as
/// `{base}/auth/{provider}/callback`.
pub struct Relay<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	base_url: Url,
	providers: Vec<ProviderClient>,
}
impl<C, M> Relay<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an empty relay that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		base_url: Url,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			base_url,
			providers: Vec::new(),
		}
	}

	/// Registers a provider under its descriptor id.
	///
	/// Re-registering an id replaces the client but keeps its original position.
	pub fn register(mut self, client: ProviderClient) -> Self {
		match self.providers.iter_mut().find(|known| known.descriptor.id == client.descriptor.id) {
			Some(known) => *known = client,
			None => self.providers.push(client),
		}

		self
	}

	/// Public base URL the callback URLs are derived from.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Iterates the registered provider descriptors in registration order.
	pub fn providers(&self) -> impl Iterator<Item = &ProviderDescriptor> {
		self.providers.iter().map(|client| &client.descriptor)
	}

	/// Looks up a registered provider by route segment.
	pub fn provider(&self, provider: &str) -> Result<&ProviderClient> {
		self.providers
			.iter()
			.find(|client| client.descriptor.id.as_ref() == provider)
			.ok_or_else(|| Error::UnknownProvider { provider: provider.to_owned() })
	}

	/// Callback URL registered with the provider for `provider`.
	pub fn callback_url(&self, provider: &ProviderId) -> Result<Url, ConfigError> {
		let base = self.base_url.as_str().trim_end_matches('/');

		Url::parse(&format!("{base}/auth/{provider}/callback"))
			.map_err(|source| ConfigError::InvalidRedirect { source })
	}
}
impl ReqwestRelay {
	/// Creates an empty relay backed by a fresh reqwest transport.
	pub fn new(base_url: Url) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(
			base_url,
			ReqwestHttpClient::new()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Debug for Relay<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Relay")
			.field("base_url", &self.base_url.as_str())
			.field("providers", &self.providers)
			.finish()
	}
}
