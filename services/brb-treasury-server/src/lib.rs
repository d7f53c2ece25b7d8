//! BRB Treasury Server
//!
//! HTTP surface over the treasury engine.
//!
//! ## Endpoints
//!
//! ### Treasury
//! - `POST /v1/treasury/init` - Create the treasury record
//! - `POST /v1/treasury/mint` - Deposit reserve, mint BRB
//! - `POST /v1/treasury/burn` - Burn BRB, redeem reserve
//! - `POST /v1/treasury/pause` - Set the circuit breaker (admin only)
//! - `GET /v1/treasury` - Read the treasury record
//!
//! ### Ledger
//! - `GET /v1/ledger/balance/:account` - Balances of an account
//! - `GET /v1/ledger/entries/:account` - Ledger entries of an account
//! - `POST /v1/faucet` - Fund an account with reserve (when enabled)
//!
//! Callers are identified by their hex address; authentication is expected
//! to happen in front of this service.

pub mod config;
pub mod error;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use brb_ledger::InMemoryLedger;
use brb_treasury::{ReserveFaucet, StateFile, StoreError, Treasury};
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::config::ServerConfig;

/// Application state
pub struct AppState {
    pub treasury: Treasury<InMemoryLedger>,
    /// Local stand-in for the reserve issuer; its mint always exists
    pub faucet: ReserveFaucet,
    pub faucet_enabled: bool,
    state_file: Option<PathBuf>,
    /// Held across a mutation and the save that follows it
    write_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let state = match &config.state_file {
            Some(path) => StateFile::load_or_default(path, config.treasury.clone())?,
            None => StateFile {
                config: config.treasury.clone(),
                ..StateFile::default()
            },
        };
        let treasury = state.into_treasury()?;

        let faucet = ReserveFaucet::new(treasury.config().reserve_asset.clone());
        faucet.install(treasury.ledger().as_ref())?;

        Ok(Self {
            treasury,
            faucet,
            faucet_enabled: config.faucet_enabled,
            state_file: config.state_file.clone(),
            write_lock: Mutex::new(()),
        })
    }

    /// Copy of the current state to roll back to, when state is persisted.
    fn checkpoint(&self) -> Option<StateFile> {
        self.state_file
            .as_ref()
            .map(|_| StateFile::from_treasury(&self.treasury))
    }

    /// Save the state. If the save fails, the engine goes back to
    /// `checkpoint` so memory never runs ahead of the file.
    fn persist(&self, checkpoint: Option<StateFile>) -> Result<(), StoreError> {
        let (Some(path), Some(checkpoint)) = (&self.state_file, checkpoint) else {
            return Ok(());
        };
        if let Err(e) = StateFile::from_treasury(&self.treasury).save(path) {
            warn!(path = %path.display(), error = %e, "Save failed, rolling back");
            checkpoint.restore_into(&self.treasury);
            return Err(e);
        }
        Ok(())
    }
}

/// Build the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        // Treasury endpoints
        .route("/v1/treasury", get(routes::get_treasury))
        .route("/v1/treasury/init", post(routes::init_treasury))
        .route("/v1/treasury/mint", post(routes::mint))
        .route("/v1/treasury/burn", post(routes::burn))
        .route("/v1/treasury/pause", post(routes::set_paused))
        // Ledger endpoints
        .route("/v1/ledger/balance/:account", get(routes::get_balance))
        .route("/v1/ledger/entries/:account", get(routes::get_entries))
        .route("/v1/faucet", post(routes::faucet))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
