//! HTTP surface: the application context, the router, and the listener.
//!
//! Handlers receive an explicit [`AppContext`] through axum state; nothing is read from
//! process-wide globals.

pub mod cookie;
pub mod page;

mod routes;
mod widget;

pub use cookie::*;

// crates.io
use axum::{
	Router,
	extract::DefaultBodyLimit,
	http::StatusCode,
	response::{Html, IntoResponse, Response},
	routing::get,
};
use tokio::{net::TcpListener, task};
// self
use crate::{
	_prelude::*,
	config::Config,
	error::TransportError,
	insight::{Analyzer, InsightError, ModelHandle, ReadinessKind},
	relay::{ProviderClient, ReqwestRelay},
	store::{MemoryStore, SessionStore},
};

/// Largest accepted upload body.
pub const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

const PURGE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppContext {
	/// Provider registry and login orchestration.
	pub relay: Arc<ReqwestRelay>,
	/// Session storage.
	pub sessions: Arc<dyn SessionStore>,
	/// Session cookie signing and attributes.
	pub cookies: CookiePolicy,
	/// Image insight analyzer.
	pub analyzer: Arc<Analyzer>,
	/// Lifetime of newly created sessions.
	pub session_ttl: Duration,
}
impl AppContext {
	/// Assembles a context from already-built parts.
	pub fn new(
		relay: ReqwestRelay,
		sessions: Arc<dyn SessionStore>,
		cookies: CookiePolicy,
		analyzer: Analyzer,
		session_ttl: Duration,
	) -> Self {
		Self { relay: Arc::new(relay), sessions, cookies, analyzer: Arc::new(analyzer), session_ttl }
	}

	/// Builds the context described by `config` on top of `sessions`.
	pub fn from_config(config: &Config, sessions: Arc<dyn SessionStore>) -> Result<Self> {
		let mut relay = ReqwestRelay::new(config.base_url.clone())?;

		for credentials in &config.providers {
			relay = relay.register(ProviderClient::builtin(
				credentials.provider,
				&credentials.client_id,
				&credentials.client_secret,
			)?);
		}

		let cookies = CookiePolicy::new(&config.session_secret, config.production)?;
		let analyzer = Analyzer::new(model_handle(config), config.palette_size)?;

		Ok(Self::new(relay, sessions, cookies, analyzer, config.session_ttl))
	}
}
impl Debug for AppContext {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppContext")
			.field("relay", &self.relay)
			.field("cookies", &self.cookies)
			.field("analyzer", &self.analyzer)
			.field("session_ttl", &self.session_ttl)
			.finish_non_exhaustive()
	}
}

/// Handler error rendered as an HTML page.
///
/// Unknown providers answer 404; every other failure is logged and answers a generic 500 page
/// without detail.
#[derive(Debug)]
pub struct ServerError(Error);
impl ServerError {
	/// Underlying relay error.
	pub fn inner(&self) -> &Error {
		&self.0
	}
}
impl<E> From<E> for ServerError
where
	E: Into<Error>,
{
	fn from(e: E) -> Self {
		Self(e.into())
	}
}
impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		match self.0 {
			Error::UnknownProvider { provider } => {
				tracing::debug!(provider, "Unknown provider requested.");

				(StatusCode::NOT_FOUND, Html(page::not_found())).into_response()
			},
			e => {
				tracing::error!(error = %e, "Request failed.");

				(StatusCode::INTERNAL_SERVER_ERROR, Html(page::error())).into_response()
			},
		}
	}
}

/// Builds the router for `ctx`.
pub fn router(ctx: AppContext) -> Router {
	Router::new()
		.route("/", get(routes::index))
		.route("/auth/{provider}", get(routes::login))
		.route("/auth/{provider}/callback", get(routes::callback))
		.route("/profile", get(routes::profile))
		.route("/logout", get(routes::logout))
		.route(
			"/insight",
			get(widget::show)
				.post(widget::analyze)
				.layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
		)
		.fallback(routes::not_found)
		.with_state(ctx)
}

/// Serves the relay on `config.listen` until Ctrl-C.
pub async fn serve(config: Config) -> Result<()> {
	let store = MemoryStore::default();
	let ctx = AppContext::from_config(&config, Arc::new(store.clone()))?;
	let listener = TcpListener::bind(config.listen).await.map_err(TransportError::from)?;
	let providers =
		ctx.relay.providers().map(|descriptor| descriptor.id.to_string()).collect::<Vec<_>>();

	tracing::info!(
		address = %config.listen,
		base_url = %config.base_url,
		production = config.production,
		?providers,
		"Relay listening."
	);

	warm_model(&ctx.analyzer);

	let purge = tokio::spawn(purge_expired(store));
	let served = axum::serve(listener, router(ctx))
		.with_graceful_shutdown(shutdown_signal())
		.await
		.map_err(TransportError::from);

	purge.abort();
	served?;

	Ok(())
}

fn model_handle(config: &Config) -> ModelHandle {
	#[cfg(feature = "onnx")]
	if let Some(path) = config.model_path.as_ref() {
		return ModelHandle::new(Arc::new(crate::insight::OnnxModelLoader::new(path)));
	}
	#[cfg(not(feature = "onnx"))]
	if config.model_path.is_some() {
		tracing::warn!("MODEL_PATH ignored: built without the `onnx` feature.");
	}

	ModelHandle::unavailable()
}

// Loads the model in the background so the first upload does not pay for it.
fn warm_model(analyzer: &Analyzer) {
	let model = analyzer.model().clone();

	if model.readiness() != ReadinessKind::Pending {
		return;
	}

	task::spawn_blocking(move || match model.classifier() {
		Ok(_) | Err(InsightError::ModelUnavailable) => {},
		Err(e) => tracing::warn!(error = %e, "Model warm-up failed; retrying on first upload."),
	});
}

async fn purge_expired(store: MemoryStore) {
	let mut interval = tokio::time::interval(PURGE_INTERVAL);

	loop {
		interval.tick().await;

		let purged = store.purge_expired(OffsetDateTime::now_utc());

		if purged > 0 {
			tracing::debug!(purged, "Expired sessions evicted.");
		}
	}
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "Failed to listen for shutdown signal.");

		std::future::pending::<()>().await;
	}

	tracing::info!("Shutting down.");
}
