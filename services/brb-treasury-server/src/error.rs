//! HTTP error mapping

use axum::{http::StatusCode, response::IntoResponse, Json};
use brb_ledger::LedgerError;
use brb_treasury::{StoreError, TreasuryError};

/// Errors returned by handlers
#[derive(Debug)]
pub enum AppError {
    Treasury(TreasuryError),
    BadRequest(String),
    FaucetDisabled,
    Store(StoreError),
}

impl From<TreasuryError> for AppError {
    fn from(e: TreasuryError) -> Self {
        AppError::Treasury(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

fn treasury_status(e: &TreasuryError) -> StatusCode {
    match e {
        TreasuryError::InvalidAmount { .. }
        | TreasuryError::ArithmeticOverflow { .. }
        | TreasuryError::UnknownReserveAsset { .. }
        | TreasuryError::Derivation(_) => StatusCode::BAD_REQUEST,
        TreasuryError::Unauthorized { .. }
        | TreasuryError::Ledger(LedgerError::Unauthorized { .. })
        | TreasuryError::Ledger(LedgerError::InvalidSigner { .. }) => StatusCode::FORBIDDEN,
        TreasuryError::NotInitialized { .. } => StatusCode::NOT_FOUND,
        TreasuryError::AlreadyInitialized { .. }
        | TreasuryError::InsufficientFunds { .. }
        | TreasuryError::PegBroken { .. } => StatusCode::CONFLICT,
        TreasuryError::TreasuryPaused => StatusCode::LOCKED,
        TreasuryError::Ledger(_) => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            AppError::Treasury(e) => (treasury_status(&e), e.code(), e.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::FaucetDisabled => (
                StatusCode::NOT_FOUND,
                "faucet_disabled",
                "Faucet is disabled. Set BRB__FAUCET_ENABLED=true to enable it.".to_string(),
            ),
            AppError::Store(e) => {
                tracing::error!(error = %e, "Failed to persist state");
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": true,
            "code": code,
            "message": message
        }));

        (status, body).into_response()
    }
}
