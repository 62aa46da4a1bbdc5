//! Error types for identifiers and amounts
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Identifier validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Invalid venue id: {0:?}")]
    InvalidVenue(String),

    #[error("Invalid operator id: {0:?}")]
    InvalidOperator(String),

    #[error("Invalid symbol code: {0:?} (expected 1-7 uppercase letters)")]
    InvalidSymbolCode(String),
}

/// Fixed-point amount errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Symbol mismatch: {left} vs {right}")]
    SymbolMismatch { left: String, right: String },

    #[error("Malformed amount: {0:?}")]
    Malformed(String),

    #[error("Precision {0} exceeds maximum of 18")]
    PrecisionTooLarge(u32),

    #[error("Amount overflow")]
    Overflow,

    #[error("Identifier error: {0}")]
    Id(#[from] IdError),
}
