//! Swap Statistics Service
//!
//! Consumes swap batches reported by AMM venues and maintains, per venue:
//! - An all-time cumulative record per symbol (volume, spot price,
//!   liquidity depth, smart price and their rolling changes)
//! - 24h of 10-minute OHLC buckets that anchor the 24h deltas
//! - 30 days of 1-hour buckets that anchor the 30d smart-price delta
//!
//! Expired buckets are pruned lazily, only when a venue's ingestion opens a
//! new bucket. There are no background timers.
//!
//! # Architecture
//!
//! ```text
//!   log(caller, venue, swaps)          reset(operator, venue)
//!          │                                   │
//!     ┌────▼────┐                              │
//!     │  Auth   │  ← venue self-authorization  │
//!     └────┬────┘                              │
//!   ┌──────▼───────────────────────────────────▼──┐
//!   │          StatsStore::transact(venue)        │
//!   │  ┌─────────────┐  ┌──────────────┐          │
//!   │  │Day baseline │  │Month baseline│ ← prune  │
//!   │  └──────┬──────┘  └──────┬───────┘          │
//!   │    ┌────▼────┐           │                  │
//!   │    │Continuity│          │                  │
//!   │    └────┬────┘           │                  │
//!   │   ┌─────▼────────────────▼┐                 │
//!   │   │  Cumulative record    │                 │
//!   │   └─────┬─────────────────┘                 │
//!   │   ┌─────▼─────┐   ┌────────────┐            │
//!   │   │Fine bucket│   │Coarse bucket│           │
//!   │   └───────────┘   └────────────┘            │
//!   └─────────────── commit or discard ───────────┘
//! ```

pub mod aggregator;
pub mod auth;
pub mod baseline;
pub mod buckets;
pub mod clock;
pub mod config;
pub mod continuity;
pub mod credential;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod records;
pub mod retention;
pub mod service;
pub mod snapshot;
pub mod store;

pub use auth::Caller;
pub use config::{Resolution, StatsConfig};
pub use engine::LogOutcome;
pub use error::StatsError;
pub use service::SwapStatsService;
pub use store::{InMemoryStore, StatsStore};

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
