//! Caller authorization
//!
//! A venue may only log its own data; only the service operator may reset
//! a venue. How a [`Caller`] is established is up to the surrounding
//! service (see [`crate::credential`] for signed requests).

use std::fmt;

use serde::{Deserialize, Serialize};
use types::ids::{OperatorId, VenueId};

use crate::error::StatsError;

/// Authenticated identity presented with a call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Caller {
    Venue(VenueId),
    Operator(OperatorId),
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::Venue(id) => write!(f, "venue:{}", id),
            Caller::Operator(id) => write!(f, "operator:{}", id),
        }
    }
}

/// `log` requires the caller to be the venue itself.
pub fn authorize_log(caller: &Caller, venue: &VenueId) -> Result<(), StatsError> {
    match caller {
        Caller::Venue(id) if id == venue => Ok(()),
        _ => Err(StatsError::Unauthorized {
            caller: caller.to_string(),
            action: "log",
            venue: venue.clone(),
        }),
    }
}

/// `reset` requires the caller to be the configured operator.
pub fn authorize_reset(
    caller: &Caller,
    operator: &OperatorId,
    venue: &VenueId,
) -> Result<(), StatsError> {
    match caller {
        Caller::Operator(id) if id == operator => Ok(()),
        _ => Err(StatsError::Unauthorized {
            caller: caller.to_string(),
            action: "reset",
            venue: venue.clone(),
        }),
    }
}
