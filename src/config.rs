//! Command-line and environment configuration.
//!
//! Every flag has an environment fallback so the relay can be configured entirely through a
//! `.env` file, which [`load_dotenv`] reads before parsing.

// std
use std::{
	net::{IpAddr, Ipv4Addr, SocketAddr},
	path::PathBuf,
};
// crates.io
use clap::Parser;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	insight::{DEFAULT_PALETTE_SIZE, validate_palette_size},
	provider::BuiltinProvider,
	store::DEFAULT_SESSION_TTL,
};

const DEFAULT_SESSION_TTL_SECS: u64 = DEFAULT_SESSION_TTL.whole_seconds() as u64;
const MAX_SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 365;

/// Raw command-line arguments.
#[derive(Clone, Parser)]
#[command(name = "gatehouse", version, about, long_about = None)]
pub struct Cli {
	/// Secret used to sign session cookies.
	#[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
	pub session_secret: String,
	/// Public base URL that provider callbacks are derived from.
	#[arg(long, env = "BASE_URL", default_value = "http://localhost:3000")]
	pub base_url: Url,
	/// Interface to listen on.
	#[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
	pub host: IpAddr,
	/// Port to listen on.
	#[arg(long, env = "PORT", default_value_t = 3000)]
	pub port: u16,
	/// Deployment environment; `production` marks session cookies `Secure`.
	#[arg(long = "env", env = "NODE_ENV", default_value = "development")]
	pub environment: String,
	/// Session lifetime in seconds.
	#[arg(long, env = "SESSION_TTL_SECS", default_value_t = DEFAULT_SESSION_TTL_SECS)]
	pub session_ttl_secs: u64,
	/// Google OAuth client id.
	#[arg(long, env = "GOOGLE_CLIENT_ID")]
	pub google_client_id: Option<String>,
	/// Google OAuth client secret.
	#[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
	pub google_client_secret: Option<String>,
	/// GitHub OAuth client id.
	#[arg(long, env = "GITHUB_CLIENT_ID")]
	pub github_client_id: Option<String>,
	/// GitHub OAuth client secret.
	#[arg(long, env = "GITHUB_CLIENT_SECRET", hide_env_values = true)]
	pub github_client_secret: Option<String>,
	/// Facebook app id.
	#[arg(long, env = "FACEBOOK_APP_ID")]
	pub facebook_app_id: Option<String>,
	/// Facebook app secret.
	#[arg(long, env = "FACEBOOK_APP_SECRET", hide_env_values = true)]
	pub facebook_app_secret: Option<String>,
	/// Number of dominant colors extracted per image.
	#[arg(long, env = "PALETTE_SIZE", default_value_t = DEFAULT_PALETTE_SIZE)]
	pub palette_size: u8,
	/// ONNX classifier to load on first upload (requires the `onnx` feature).
	#[arg(long, env = "MODEL_PATH")]
	pub model_path: Option<PathBuf>,
}
impl Debug for Cli {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Cli")
			.field("base_url", &self.base_url.as_str())
			.field("host", &self.host)
			.field("port", &self.port)
			.field("environment", &self.environment)
			.finish_non_exhaustive()
	}
}

/// Credentials for one configured provider.
#[derive(Clone)]
pub struct ProviderCredentials {
	/// Provider the credentials belong to.
	pub provider: BuiltinProvider,
	/// OAuth client id.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: String,
}
impl Debug for ProviderCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderCredentials")
			.field("provider", &self.provider)
			.field("client_id", &self.client_id)
			.finish_non_exhaustive()
	}
}

/// Validated runtime configuration.
#[derive(Clone)]
pub struct Config {
	/// Cookie signing secret.
	pub session_secret: String,
	/// Public base URL.
	pub base_url: Url,
	/// Listen address.
	pub listen: SocketAddr,
	/// Whether the relay runs in production mode.
	pub production: bool,
	/// Session lifetime.
	pub session_ttl: Duration,
	/// Providers with both halves of their credentials configured.
	pub providers: Vec<ProviderCredentials>,
	/// Colors extracted per image.
	pub palette_size: u8,
	/// Optional classifier model file.
	pub model_path: Option<PathBuf>,
}
impl Config {
	/// Validates raw arguments.
	pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
		if cli.session_secret.trim().is_empty() {
			return Err(ConfigError::MissingSessionSecret);
		}
		if !(1..=MAX_SESSION_TTL_SECS).contains(&cli.session_ttl_secs) {
			return Err(ConfigError::SessionTtl {
				secs: cli.session_ttl_secs,
				max: MAX_SESSION_TTL_SECS,
			});
		}

		validate_palette_size(cli.palette_size)?;

		let pairs = [
			(BuiltinProvider::Google, cli.google_client_id, cli.google_client_secret),
			(BuiltinProvider::GitHub, cli.github_client_id, cli.github_client_secret),
			(BuiltinProvider::Facebook, cli.facebook_app_id, cli.facebook_app_secret),
		];
		let mut providers = Vec::new();

		for (provider, id, secret) in pairs {
			match (non_blank(id), non_blank(secret)) {
				(Some(client_id), Some(client_secret)) =>
					providers.push(ProviderCredentials { provider, client_id, client_secret }),
				(None, None) => tracing::debug!(%provider, "Provider not configured."),
				_ => return Err(ConfigError::IncompleteCredentials { provider: provider.as_str() }),
			}
		}

		Ok(Self {
			session_secret: cli.session_secret,
			base_url: cli.base_url,
			listen: SocketAddr::new(cli.host, cli.port),
			production: cli.environment.eq_ignore_ascii_case("production"),
			session_ttl: Duration::seconds(cli.session_ttl_secs as i64),
			providers,
			palette_size: cli.palette_size,
			model_path: cli.model_path,
		})
	}
}
impl Debug for Config {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Config")
			.field("base_url", &self.base_url.as_str())
			.field("listen", &self.listen)
			.field("production", &self.production)
			.field("session_ttl", &self.session_ttl)
			.field("providers", &self.providers)
			.field("palette_size", &self.palette_size)
			.field("model_path", &self.model_path)
			.finish_non_exhaustive()
	}
}

/// Loads `.env` from the working directory (or a parent), if present.
///
/// Returns the loaded file path. Variables already set in the environment win.
pub fn load_dotenv() -> Option<PathBuf> {
	dotenvy::dotenv().ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}
