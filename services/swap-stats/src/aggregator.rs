//! Cumulative record aggregation
//!
//! Merges a batch into the venue's all-time record. The 24h delta is
//! reconstructed from the running cumulative volume and the day baseline;
//! the 30d smart-price delta from the month baseline.
//!
//! Swaps are applied in batch order. A symbol repeated inside one batch
//! keeps accumulating, so cumulative volume always equals the sum of all
//! quantities logged for it.

use std::collections::BTreeMap;

use types::ids::{SymbolCode, VenueId};
use types::numeric::Amount;
use types::swap::SwapRecord;

use crate::baseline::{DayBaseline, MonthBaseline};
use crate::continuity::LastState;
use crate::error::StatsError;
use crate::records::{CumulativeRecord, SymbolStats};

/// Build the next cumulative record for `venue`.
pub fn aggregate(
    existing: Option<&CumulativeRecord>,
    venue: &VenueId,
    last: &LastState,
    day: &DayBaseline,
    month: &MonthBaseline,
    swaps: &[SwapRecord],
    now: i64,
) -> Result<CumulativeRecord, StatsError> {
    match existing {
        None => first_record(venue, swaps, now),
        Some(record) => merge(record, last, day, month, swaps, now),
    }
}

/// First ingestion: volumes straight from the batch, deltas zeroed.
fn first_record(
    venue: &VenueId,
    swaps: &[SwapRecord],
    now: i64,
) -> Result<CumulativeRecord, StatsError> {
    let mut record = CumulativeRecord::new(venue.clone(), now);
    for swap in swaps {
        let stats = match record.symbols.remove(swap.code()) {
            None => SymbolStats {
                volume_24h: swap.quantity.clone(),
                volume_cumulative: swap.quantity.clone(),
                price: swap.price,
                price_change_24h: 0.0,
                liquidity_depth: swap.liquidity_depth.clone(),
                smart_price: swap.smart_price,
                smart_price_change_30d: 0.0,
            },
            Some(prev) => SymbolStats {
                volume_24h: prev.volume_24h.checked_add(&swap.quantity)?,
                volume_cumulative: prev.volume_cumulative.checked_add(&swap.quantity)?,
                price: swap.price,
                price_change_24h: 0.0,
                liquidity_depth: swap.liquidity_depth.clone(),
                smart_price: swap.smart_price,
                smart_price_change_30d: 0.0,
            },
        };
        record.symbols.insert(swap.code().clone(), stats);
    }
    Ok(record)
}

fn merge(
    existing: &CumulativeRecord,
    last: &LastState,
    day: &DayBaseline,
    month: &MonthBaseline,
    swaps: &[SwapRecord],
    now: i64,
) -> Result<CumulativeRecord, StatsError> {
    let mut record = existing.clone();
    record.timestamp = now;

    let mut running: BTreeMap<SymbolCode, Amount> = last
        .symbols()
        .iter()
        .map(|(code, baseline)| (code.clone(), baseline.volume_cumulative.clone()))
        .collect();

    for swap in swaps {
        let code = swap.code();

        // Fallbacks when the baseline bucket predates this symbol:
        // zero volume, current price, and a zero smart-price reference.
        let base_volume = day
            .volume_cumulative(code)
            .cloned()
            .unwrap_or_else(|| Amount::zero(swap.symbol().clone()));
        let base_price = day.price(code).unwrap_or(swap.price);
        let open_smart_price = month.open_smart_price(code).unwrap_or(0.0);

        let prior = running
            .get(code)
            .cloned()
            .unwrap_or_else(|| Amount::zero(swap.symbol().clone()));
        let volume_cumulative = prior.checked_add(&swap.quantity)?;
        let volume_24h = volume_cumulative.checked_sub(&base_volume)?;

        record.symbols.insert(
            code.clone(),
            SymbolStats {
                volume_24h,
                volume_cumulative: volume_cumulative.clone(),
                price: swap.price,
                price_change_24h: swap.price - base_price,
                liquidity_depth: swap.liquidity_depth.clone(),
                smart_price: swap.smart_price,
                smart_price_change_30d: swap.smart_price - open_smart_price,
            },
        );
        running.insert(code.clone(), volume_cumulative);
    }

    Ok(record)
}
