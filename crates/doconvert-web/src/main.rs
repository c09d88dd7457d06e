//! doconvert Web - HTTP server for image-to-PDF, PDF merging and office conversion.

mod helpers;
mod routes;
mod state;

use anyhow::{Context, Result, bail};
use clap::Parser;
use doconvert_core::{AppConfig, ConverterBackend};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "doconvert-web")]
#[command(author, version, about = "doconvert Web Server", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port to bind to
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Config file (defaults to the user config dir, then ./config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Office conversion backend (convertapi, libreoffice, disabled)
    #[arg(long, env = "DOCONVERT_BACKEND")]
    backend: Option<String>,

    /// ConvertAPI secret
    #[arg(long, env = "CONVERTAPI_SECRET", hide_env_values = true)]
    convertapi_secret: Option<String>,

    /// ConvertAPI base URL
    #[arg(long, env = "CONVERTAPI_BASE")]
    convertapi_base: Option<String>,

    /// Path to the LibreOffice `soffice` binary
    #[arg(long, env = "SOFFICE_PATH")]
    soffice_path: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Load the config file and apply command line / environment overrides.
    fn into_config(self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => AppConfig::load(),
        };

        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(name) = self.backend {
            let Some(backend) = ConverterBackend::from_name(&name) else {
                bail!("Unknown converter backend: {name}");
            };
            config.converter.backend = Some(backend);
        }
        if let Some(secret) = self.convertapi_secret {
            config.converter.api_secret = Some(secret);
        }
        if let Some(base) = self.convertapi_base {
            config.converter.api_base = base;
        }
        if let Some(path) = self.soffice_path {
            config.converter.soffice_path = path;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let config = args.into_config()?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;

    let state = Arc::new(AppState::new(config).context("Failed to initialize application state")?);

    if state.converter.is_available() {
        info!("Office conversion via {}", state.converter.name());
    } else {
        warn!(
            "Office conversion unavailable ({}); only image and merge tools are enabled",
            state.converter.name()
        );
    }

    let app = routes::router(state);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
