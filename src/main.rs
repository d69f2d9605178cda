//! `gatehouse` binary: parses configuration and serves the relay.

// crates.io
use clap::Parser;
// self
use gatehouse::{
	config::{Cli, Config, load_dotenv},
	obs, server,
};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let dotenv = load_dotenv();

	obs::install_subscriber();

	if let Some(path) = dotenv {
		tracing::debug!(path = %path.display(), "Loaded environment file.");
	}

	let config = Config::from_cli(Cli::parse())?;

	server::serve(config).await?;

	Ok(())
}
