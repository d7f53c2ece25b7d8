//! Server Configuration
//!
//! Sources, lowest precedence first: an optional config file,
//! `config/default`, `config/local`, then `BRB__*` environment variables
//! (e.g. `BRB__SERVER__PORT=8080`). Command-line flags override all of them.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use brb_treasury::TreasuryConfig;
use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub treasury: TreasuryConfig,

    /// Expose `POST /v1/faucet` for local testing
    #[serde(default)]
    pub faucet_enabled: bool,

    /// Persist state to this file after every mutation
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

/// Server binding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl ServerConfig {
    /// Load configuration from environment and optional config file
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("BRB")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build().context("reading configuration")?;
        config
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Configuration for tests and local runs: faucet on, nothing persisted
    pub fn development() -> Self {
        Self {
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: default_log_format(),
            },
            faucet_enabled: true,
            ..Self::default()
        }
    }
}
