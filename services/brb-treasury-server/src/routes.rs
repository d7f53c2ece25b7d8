//! Request handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use brb_core::{Address, Amount, AssetId};
use brb_ledger::LedgerEntry;
use brb_treasury::{HolderBalances, TreasuryView};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::AppState;

type Shared = State<Arc<AppState>>;

// ============================================================================
// Root Handlers
// ============================================================================

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "BRB Treasury",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "1:1 USDC-collateralized BRB issuance",
        "endpoints": {
            "treasury": {
                "view": "GET /v1/treasury",
                "init": "POST /v1/treasury/init",
                "mint": "POST /v1/treasury/mint",
                "burn": "POST /v1/treasury/burn",
                "pause": "POST /v1/treasury/pause"
            },
            "ledger": {
                "balance": "GET /v1/ledger/balance/:account",
                "entries": "GET /v1/ledger/entries/:account",
                "faucet": "POST /v1/faucet"
            }
        }
    }))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "healthy"}))
}

// ============================================================================
// Treasury Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct InitRequest {
    pub admin: Address,
    pub reserve_asset: Option<AssetId>,
}

#[derive(Debug, Serialize)]
pub struct TreasuryResponse {
    pub success: bool,
    pub treasury: TreasuryView,
}

pub async fn init_treasury(
    State(state): Shared,
    Json(req): Json<InitRequest>,
) -> Result<Json<TreasuryResponse>, AppError> {
    let reserve_asset = req
        .reserve_asset
        .unwrap_or_else(|| state.treasury.config().reserve_asset.clone());

    let _guard = state.write_lock.lock().await;
    let checkpoint = state.checkpoint();
    let record = state.treasury.initialize(&req.admin, &reserve_asset)?;
    state.persist(checkpoint)?;

    Ok(Json(TreasuryResponse {
        success: true,
        treasury: record.view(),
    }))
}

pub async fn get_treasury(State(state): Shared) -> Result<Json<TreasuryView>, AppError> {
    let address = state.treasury.treasury_address()?;
    Ok(Json(state.treasury.view(&address)?))
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub caller: Address,
    /// Smallest units (6 decimals)
    pub amount: u64,
}

#[derive(Debug, Serialize)]
pub struct OperationResponse {
    pub success: bool,
    pub amount: Amount,
    pub treasury: TreasuryView,
    pub balances: HolderBalances,
}

pub async fn mint(
    State(state): Shared,
    Json(req): Json<AmountRequest>,
) -> Result<Json<OperationResponse>, AppError> {
    let address = state.treasury.treasury_address()?;
    let amount = Amount::new(req.amount);

    let _guard = state.write_lock.lock().await;
    let checkpoint = state.checkpoint();
    let record = state.treasury.mint(&address, &req.caller, amount)?;
    state.persist(checkpoint)?;

    Ok(Json(OperationResponse {
        success: true,
        amount,
        treasury: record.view(),
        balances: state.treasury.balances(&address, &req.caller)?,
    }))
}

pub async fn burn(
    State(state): Shared,
    Json(req): Json<AmountRequest>,
) -> Result<Json<OperationResponse>, AppError> {
    let address = state.treasury.treasury_address()?;
    let amount = Amount::new(req.amount);

    let _guard = state.write_lock.lock().await;
    let checkpoint = state.checkpoint();
    let record = state.treasury.burn(&address, &req.caller, amount)?;
    state.persist(checkpoint)?;

    Ok(Json(OperationResponse {
        success: true,
        amount,
        treasury: record.view(),
        balances: state.treasury.balances(&address, &req.caller)?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PauseRequest {
    pub caller: Address,
    pub paused: bool,
}

pub async fn set_paused(
    State(state): Shared,
    Json(req): Json<PauseRequest>,
) -> Result<Json<TreasuryResponse>, AppError> {
    let address = state.treasury.treasury_address()?;

    let _guard = state.write_lock.lock().await;
    let checkpoint = state.checkpoint();
    let record = state.treasury.set_paused(&address, &req.caller, req.paused)?;
    state.persist(checkpoint)?;

    Ok(Json(TreasuryResponse {
        success: true,
        treasury: record.view(),
    }))
}

// ============================================================================
// Ledger Handlers
// ============================================================================

fn parse_account(raw: &str) -> Result<Address, AppError> {
    raw.parse()
        .map_err(|e| AppError::BadRequest(format!("Invalid account {}: {}", raw, e)))
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub account: Address,
    pub balances: BTreeMap<AssetId, Amount>,
}

pub async fn get_balance(
    State(state): Shared,
    Path(account): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let account = parse_account(&account)?;
    let balances = state
        .treasury
        .ledger()
        .account_state(&account)
        .map(|a| a.balances)
        .unwrap_or_default();

    Ok(Json(BalanceResponse { account, balances }))
}

#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    pub account: Address,
    pub count: usize,
    pub entries: Vec<LedgerEntry>,
}

/// Newest first
pub async fn get_entries(
    State(state): Shared,
    Path(account): Path<String>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<EntriesResponse>, AppError> {
    let account = parse_account(&account)?;
    let limit = query.limit.unwrap_or(50);
    let entries: Vec<LedgerEntry> = state
        .treasury
        .ledger()
        .account_entries(&account)
        .into_iter()
        .rev()
        .take(limit)
        .collect();

    Ok(Json(EntriesResponse {
        account,
        count: entries.len(),
        entries,
    }))
}

#[derive(Debug, Deserialize)]
pub struct FaucetRequest {
    pub to: Address,
    pub amount: u64,
}

pub async fn faucet(
    State(state): Shared,
    Json(req): Json<FaucetRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.faucet_enabled {
        return Err(AppError::FaucetDisabled);
    }

    let _guard = state.write_lock.lock().await;
    let checkpoint = state.checkpoint();
    let balance = state
        .faucet
        .drip(state.treasury.ledger().as_ref(), &req.to, Amount::new(req.amount))?;
    state.persist(checkpoint)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "asset": state.faucet.asset(),
        "to": req.to,
        "balance": balance
    })))
}
