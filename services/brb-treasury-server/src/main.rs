//! BRB Treasury Server
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings
//! brb-treasury-server
//!
//! # Local testing with the faucet and a state file
//! BRB__FAUCET_ENABLED=true BRB__STATE_FILE=brb-state.json brb-treasury-server
//!
//! # Environment overrides
//! BRB__SERVER__PORT=8080 brb-treasury-server
//! ```

use std::sync::Arc;

use brb_treasury_server::{config::LoggingConfig, config::ServerConfig, create_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// BRB Treasury Server
#[derive(Parser, Debug)]
#[command(name = "brb-treasury-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "BRB_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Log format (json, pretty)
    #[arg(long)]
    log_format: Option<String>,

    /// Enable the reserve faucet
    #[arg(long)]
    faucet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        server_config.server.host = host;
    }
    if let Some(port) = args.port {
        server_config.server.port = port;
    }
    if let Some(format) = args.log_format {
        server_config.logging.format = format;
    }
    if args.faucet {
        server_config.faucet_enabled = true;
    }

    init_logging(&server_config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        program = %server_config.treasury.program_id,
        "Starting BRB Treasury Server"
    );

    let state = Arc::new(AppState::new(&server_config)?);
    match state.treasury.treasury_address() {
        Ok(address) if state.treasury.record(&address).is_ok() => {
            tracing::info!(treasury = %address, "Loaded existing treasury");
        }
        _ => tracing::info!("No treasury yet. Call POST /v1/treasury/init first."),
    }
    if server_config.faucet_enabled {
        tracing::warn!("Reserve faucet is enabled");
    }

    let app = create_router(state);

    let addr = server_config.server.socket_addr()?;
    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => subscriber.with(fmt::layer().json().with_target(true)).init(),
        _ => subscriber.with(fmt::layer().with_target(true)).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
