//! `shared-sessions` server binary

use clap::Parser;
use shared_sessions_api::{HttpServer, build_app, shutdown_signal};
use shared_sessions_conf::{LoggingSettings, Settings};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Serve the shared session API
#[derive(Debug, Parser)]
#[command(name = "shared-sessions", version, about)]
struct Cli {
	/// Settings file (.toml or .json); environment variables override it
	#[arg(long, value_name = "PATH")]
	settings: Option<PathBuf>,

	/// Address to listen on, overriding the settings
	#[arg(long, value_name = "ADDR")]
	bind: Option<String>,
}

fn init_tracing(logging: &LoggingSettings) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
	let builder = tracing_subscriber::fmt().with_env_filter(filter);

	if logging.format == "json" {
		builder.json().init();
	} else {
		builder.init();
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let cli = Cli::parse();

	let mut settings = Settings::load(cli.settings.as_deref())?;
	if let Some(bind) = cli.bind {
		settings.bind_address = bind;
	}
	init_tracing(&settings.logging);

	let app = build_app(&settings).await?;
	let addr: SocketAddr = settings.bind_address.parse()?;

	HttpServer::new(app.handler)
		.listen_with_shutdown(addr, shutdown_signal())
		.await?;

	tracing::info!("server stopped");
	Ok(())
}
