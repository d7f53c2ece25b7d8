//! Error types for BRB core primitives

use thiserror::Error;

/// Errors produced while parsing or deriving core values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid address: {message}")]
    InvalidAddress { message: String },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Namespace is {len} bytes, maximum is {max}")]
    NamespaceTooLong { len: usize, max: usize },

    #[error("Derived address lies on the curve")]
    OnCurveDerivation,

    #[error("No viable derivation nonce for namespace {namespace}")]
    NoViableNonce { namespace: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
