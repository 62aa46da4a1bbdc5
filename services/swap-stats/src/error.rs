//! Error taxonomy for the swap statistics service

use thiserror::Error;
use types::errors::AmountError;
use types::ids::VenueId;

use crate::config::ConfigError;
use crate::credential::CredentialError;
use crate::snapshot::SnapshotError;

/// Top-level service error. Any error aborts the whole call with no state change.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Unauthorized: {caller} may not {action} for {venue}")]
    Unauthorized {
        caller: String,
        action: &'static str,
        venue: VenueId,
    },

    #[error("Venue not allowed: {0}")]
    VenueNotAllowed(VenueId),

    #[error("Invalid swap for {venue}: {reason}")]
    InvalidSwap { venue: VenueId, reason: String },

    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("Store partition poisoned for {0}")]
    StorePoisoned(VenueId),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),
}

impl StatsError {
    /// Whether the error is an authorization rejection.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            StatsError::Unauthorized { .. } | StatsError::VenueNotAllowed(_) | StatsError::Credential(_)
        )
    }
}
