//! Service configuration
//!
//! Two retention classes: a fine "day" resolution feeding the 24h window
//! and a coarse "month" resolution feeding the 30d window.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::ids::{OperatorId, VenueId};

use crate::clock::bucket_start;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{name}: interval must be positive, got {interval_secs}")]
    NonPositiveInterval { name: &'static str, interval_secs: i64 },

    #[error("{name}: retention {retention_secs}s is shorter than one interval ({interval_secs}s)")]
    RetentionTooShort {
        name: &'static str,
        interval_secs: i64,
        retention_secs: i64,
    },
}

/// Bucket width and retention horizon for one retention class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub interval_secs: i64,
    pub retention_secs: i64,
}

impl Resolution {
    pub const fn new(interval_secs: i64, retention_secs: i64) -> Self {
        Self {
            interval_secs,
            retention_secs,
        }
    }

    /// 10-minute buckets kept for 24 hours.
    pub const fn day() -> Self {
        Self::new(600, 86_400)
    }

    /// 1-hour buckets kept for 30 days.
    pub const fn month() -> Self {
        Self::new(3_600, 30 * 86_400)
    }

    /// Bucket key containing `now`.
    pub fn bucket_start(&self, now: i64) -> i64 {
        bucket_start(now, self.interval_secs)
    }

    /// Upper bound on buckets a venue accumulates in this class.
    pub fn max_buckets(&self) -> usize {
        (self.retention_secs / self.interval_secs) as usize
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.interval_secs <= 0 {
            return Err(ConfigError::NonPositiveInterval {
                name,
                interval_secs: self.interval_secs,
            });
        }
        if self.retention_secs < self.interval_secs {
            return Err(ConfigError::RetentionTooShort {
                name,
                interval_secs: self.interval_secs,
                retention_secs: self.retention_secs,
            });
        }
        Ok(())
    }
}

/// Configuration for the swap statistics service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Fine buckets (24h volume, price change, OHLC).
    pub day: Resolution,
    /// Coarse buckets (30d smart-price change).
    pub month: Resolution,
    /// Identity allowed to reset venues.
    pub operator: OperatorId,
    /// When set, only these venues may log.
    pub allowed_venues: Option<BTreeSet<VenueId>>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            day: Resolution::day(),
            month: Resolution::month(),
            operator: OperatorId::new("swapsdata"),
            allowed_venues: None,
        }
    }
}

impl StatsConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: StatsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.day.validate("day")?;
        self.month.validate("month")
    }

    /// Whether `venue` passes the optional allow-list.
    pub fn is_venue_allowed(&self, venue: &VenueId) -> bool {
        self.allowed_venues
            .as_ref()
            .map_or(true, |allowed| allowed.contains(venue))
    }
}
