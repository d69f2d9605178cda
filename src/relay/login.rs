//! Login entry and provider callback orchestration.

// self
use crate::{
	_prelude::*,
	auth::{Identity, ProviderId, random_alphanumeric},
	http::TokenHttpClient,
	oauth::{BasicFacade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{ProfileError, ProviderDescriptor},
	relay::{ProviderClient, Relay},
	store::PendingLogin,
};

const STATE_LEN: usize = 32;

/// Redirect issued at login entry.
#[derive(Clone, Debug)]
pub struct LoginRedirect {
	/// Provider the browser is sent to.
	pub provider: ProviderId,
	/// Anti-forgery value that must round-trip through the provider.
	pub state: String,
	/// Fully-formed authorize URL.
	pub authorize_url: Url,
}
impl LoginRedirect {
	/// Pending-login record the caller stores in the session.
	pub fn pending(&self) -> PendingLogin {
		PendingLogin { provider: self.provider.clone(), state: self.state.clone() }
	}
}

/// Query parameters a provider appends to the callback URL.
#[derive(Clone, Default, Deserialize)]
pub struct CallbackParams {
	/// Authorization code issued on success.
	#[serde(default)]
	pub code: Option<String>,
	/// State echoed back by the provider.
	#[serde(default)]
	pub state: Option<String>,
	/// OAuth error code issued on denial.
	#[serde(default)]
	pub error: Option<String>,
	/// Human-readable companion to `error`.
	#[serde(default)]
	pub error_description: Option<String>,
}
impl Debug for CallbackParams {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CallbackParams")
			.field("code_set", &self.code.is_some())
			.field("state_set", &self.state.is_some())
			.field("error", &self.error)
			.field("error_description", &self.error_description)
			.finish()
	}
}

impl<C, M> Relay<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the authorization redirect for `provider` with a fresh `state`.
	pub fn start_login(&self, provider: &str) -> Result<LoginRedirect> {
		const KIND: FlowKind = FlowKind::Login;

		let _guard = FlowSpan::new(KIND, "start_login").entered();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = self.provider(provider).and_then(|client| {
			let redirect_uri = self.callback_url(&client.descriptor.id)?;
			let state = random_alphanumeric(STATE_LEN);
			let authorize_url =
				build_authorize_url(&client.descriptor, &client.client_id, &redirect_uri, &state);

			Ok(LoginRedirect { provider: client.descriptor.id.clone(), state, authorize_url })
		});

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(e) => {
				tracing::warn!(provider, error = %e, "Login entry rejected.");
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	/// Completes a login: validates `state`, exchanges the code, and maps the profile.
	///
	/// `pending` is the login recorded in the browser's session at entry; a callback without
	/// one, for another provider, or with a different state is rejected before any provider
	/// call is made.
	pub async fn complete_login(
		&self,
		provider: &str,
		params: CallbackParams,
		pending: Option<&PendingLogin>,
	) -> Result<Identity> {
		const KIND: FlowKind = FlowKind::Callback;

		let span = FlowSpan::new(KIND, "complete_login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let client = self.provider(provider)?;

				if let Some(error) = params.error {
					return Err(Error::AccessDenied {
						reason: params.error_description.unwrap_or(error),
					});
				}

				validate_state(&client.descriptor.id, params.state.as_deref(), pending)?;

				let code = params
					.code
					.filter(|code| !code.trim().is_empty())
					.ok_or(Error::MissingCode)?;

				self.fetch_identity(client, &code).await
			})
			.await;

		match &result {
			Ok(identity) => {
				tracing::info!(provider, user = %identity.external_id, "Login completed.");
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(e) => {
				tracing::warn!(provider, error = %e, "Login callback failed.");
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn fetch_identity(&self, client: &ProviderClient, code: &str) -> Result<Identity> {
		let descriptor = &client.descriptor;
		let strategy = client.strategy.as_ref();
		let facade: BasicFacade<C, M> = BasicFacade::from_descriptor(
			descriptor,
			&client.client_id,
			client.client_secret.as_deref(),
			&self.callback_url(&descriptor.id)?,
			self.http_client.clone(),
			self.transport_mapper.clone(),
		)?;
		let token = facade.exchange_code(strategy, code).await?;
		let profile = facade.fetch_json(&descriptor.endpoints.profile, &token).await?;
		let mut draft = strategy.identity_from_profile(&profile)?;

		// A missing email only degrades the display name, so listing failures are not fatal.
		let email_endpoint = descriptor.endpoints.email.as_ref().filter(|_| draft.email.is_none());

		if let Some(endpoint) = email_endpoint {
			match facade.fetch_json(endpoint, &token).await {
				Ok(body) => match strategy.primary_email(&body) {
					Ok(email) => draft.email = email,
					Err(e) => tracing::warn!(error = %e, "Email listing is malformed."),
				},
				Err(e) => tracing::warn!(error = %e, "Email listing request failed."),
			}
		}

		draft.finish(descriptor.id.clone()).map_err(|e| ProfileError::from(e).into())
	}
}

fn build_authorize_url(
	descriptor: &ProviderDescriptor,
	client_id: &str,
	redirect_uri: &Url,
	state: &str,
) -> Url {
	let mut url = descriptor.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());

	if let Some(scope) = descriptor.scope_param() {
		pairs.append_pair("scope", &scope);
	}

	pairs.append_pair("state", state);

	drop(pairs);

	url
}

fn validate_state(
	provider: &ProviderId,
	returned: Option<&str>,
	pending: Option<&PendingLogin>,
) -> Result<()> {
	match (returned, pending) {
		(Some(returned), Some(pending))
			if &pending.provider == provider
				&& constant_time_eq(returned.as_bytes(), pending.state.as_bytes()) =>
			Ok(()),
		_ => Err(Error::StateMismatch),
	}
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
	a.len() == b.len() && a.iter().zip(b).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		provider::BuiltinProvider,
		relay::{ProviderClient, ReqwestRelay},
	};

	fn relay() -> ReqwestRelay {
		let base = Url::parse("http://localhost:3000").expect("Base URL fixture should parse.");
		let mut relay = ReqwestRelay::new(base).expect("Relay should build.");

		for provider in BuiltinProvider::ALL {
			relay = relay.register(
				ProviderClient::builtin(provider, format!("{provider}-id"), "secret")
					.expect("Built-in client should build."),
			);
		}

		relay
	}

	fn query(url: &Url) -> HashMap<String, String> {
		url.query_pairs().into_owned().collect()
	}

	#[test]
	fn authorize_urls_carry_configured_scopes() {
		let relay = relay();
		let cases = [
			("google", "accounts.google.com", Some("email profile")),
			("github", "github.com", Some("user:email")),
			("facebook", "www.facebook.com", None),
		];

		for (provider, host, scope) in cases {
			let redirect = relay.start_login(provider).expect("Login entry should succeed.");
			let params = query(&redirect.authorize_url);

			assert_eq!(redirect.authorize_url.host_str(), Some(host));
			assert_eq!(params.get("response_type").map(String::as_str), Some("code"));
			assert_eq!(params.get("client_id"), Some(&format!("{provider}-id")));
			assert_eq!(
				params.get("redirect_uri"),
				Some(&format!("http://localhost:3000/auth/{provider}/callback"))
			);
			assert_eq!(params.get("scope").map(String::as_str), scope);
			assert_eq!(params.get("state"), Some(&redirect.state));
			assert_eq!(redirect.state.len(), STATE_LEN);
		}
	}

	#[test]
	fn login_entry_rejects_unknown_provider() {
		assert!(matches!(relay().start_login("myspace"), Err(Error::UnknownProvider { .. })));
	}

	#[test]
	fn state_validation_requires_matching_pending_login() {
		let google = ProviderId::new("google").expect("Provider fixture should be valid.");
		let github = ProviderId::new("github").expect("Provider fixture should be valid.");
		let pending = PendingLogin { provider: google.clone(), state: "expected".into() };

		assert!(validate_state(&google, Some("expected"), Some(&pending)).is_ok());
		assert!(validate_state(&google, Some("other"), Some(&pending)).is_err());
		assert!(validate_state(&google, None, Some(&pending)).is_err());
		assert!(validate_state(&google, Some("expected"), None).is_err());
		assert!(validate_state(&github, Some("expected"), Some(&pending)).is_err());
	}

	#[tokio::test]
	async fn provider_denial_short_circuits() {
		let params = CallbackParams {
			error: Some("access_denied".into()),
			error_description: Some("User cancelled".into()),
			..Default::default()
		};
		let err = relay()
			.complete_login("github", params, None)
			.await
			.expect_err("Denied callback should fail.");

		assert!(matches!(err, Error::AccessDenied { reason } if reason == "User cancelled"));
	}

	#[tokio::test]
	async fn missing_code_is_rejected_after_state_check() {
		let pending = PendingLogin {
			provider: ProviderId::new("google").expect("Provider fixture should be valid."),
			state: "s".into(),
		};
		let params = CallbackParams { state: Some("s".into()), ..Default::default() };
		let err = relay()
			.complete_login("google", params, Some(&pending))
			.await
			.expect_err("Callback without code should fail.");

		assert!(matches!(err, Error::MissingCode));
	}
}
