//! Ingestion pipeline for one batch
//!
//! Runs, in order, against a single staged transaction:
//! day baseline → month baseline → continuity → cumulative record →
//! fine bucket → coarse bucket. The caller commits the transaction only
//! if every stage succeeds.

use serde::{Deserialize, Serialize};
use types::ids::VenueId;
use types::swap::SwapRecord;

use crate::aggregator::aggregate;
use crate::baseline::{resolve_day_baseline, resolve_month_baseline};
use crate::buckets::{upsert_coarse_bucket, upsert_fine_bucket};
use crate::config::StatsConfig;
use crate::continuity::LastState;
use crate::error::StatsError;
use crate::store::VenueTxn;

/// What one ingestion did to the venue's tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOutcome {
    pub venue: VenueId,
    pub timestamp: i64,
    pub fine_bucket: i64,
    pub coarse_bucket: i64,
    pub first_ingestion: bool,
    pub fine_created: bool,
    pub coarse_created: bool,
    pub fine_pruned: usize,
    pub coarse_pruned: usize,
    pub swaps: usize,
}

/// Reject batches that carry a non-finite price. Needs no stored state.
pub fn check_swaps(venue: &VenueId, swaps: &[SwapRecord]) -> Result<(), StatsError> {
    match swaps.iter().find(|s| !s.has_finite_prices()) {
        Some(bad) => Err(StatsError::InvalidSwap {
            venue: venue.clone(),
            reason: format!("non-finite price for {}", bad.code()),
        }),
        None => Ok(()),
    }
}

/// Apply `swaps` observed at `now` to the staged tables of one venue.
pub fn ingest_batch(
    txn: &mut VenueTxn<'_>,
    config: &StatsConfig,
    swaps: &[SwapRecord],
    now: i64,
) -> Result<LogOutcome, StatsError> {
    let venue = txn.venue().clone();
    check_swaps(&venue, swaps)?;

    let day = resolve_day_baseline(&mut txn.fine, &config.day, now, swaps);
    let month = resolve_month_baseline(&mut txn.coarse, &config.month, now, swaps);

    let existing = txn.cumulative();
    let first_ingestion = existing.is_none();
    let last = LastState::resolve(existing, &day.baseline, swaps);
    let record = aggregate(
        existing,
        &venue,
        &last,
        &day.baseline,
        &month.baseline,
        swaps,
        now,
    )?;
    txn.put_cumulative(record);

    let fine_bucket = config.day.bucket_start(now);
    let coarse_bucket = config.month.bucket_start(now);
    let fine_created = upsert_fine_bucket(&mut txn.fine, fine_bucket, &last, swaps)?;
    let coarse_created = upsert_coarse_bucket(&mut txn.coarse, coarse_bucket, swaps);

    Ok(LogOutcome {
        venue,
        timestamp: now,
        fine_bucket,
        coarse_bucket,
        first_ingestion,
        fine_created,
        coarse_created,
        fine_pruned: day.pruned,
        coarse_pruned: month.pruned,
        swaps: swaps.len(),
    })
}
