//! Fine and coarse bucket upserts
//!
//! A new fine bucket records where each symbol's cumulative volume stood
//! before its opening batch. Once that bucket becomes the oldest retained
//! one, those baselines yield the 24h deltas. Coarse buckets are written
//! once and never touched again.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::debug;
use types::swap::SwapRecord;

use crate::continuity::LastState;
use crate::error::StatsError;
use crate::records::{Candle, CoarseBucket, FineBucket};
use crate::store::StagedTable;

/// Create or update the fine bucket at `key`. Returns true if created.
pub fn upsert_fine_bucket(
    fine: &mut StagedTable<'_, FineBucket>,
    key: i64,
    last: &LastState,
    swaps: &[SwapRecord],
) -> Result<bool, StatsError> {
    if let Some(bucket) = fine.get_mut(key) {
        for swap in swaps {
            match bucket.candles.entry(swap.code().clone()) {
                Entry::Occupied(mut candle) => candle.get_mut().update(swap)?,
                // symbol first seen after the bucket opened
                Entry::Vacant(slot) => slot.insert(Candle::zeroed(swap.symbol().clone())).update(swap)?,
            }
        }
        return Ok(false);
    }

    let mut candles: BTreeMap<_, Candle> = BTreeMap::new();
    for swap in swaps {
        match candles.entry(swap.code().clone()) {
            Entry::Occupied(mut candle) => candle.get_mut().update(swap)?,
            Entry::Vacant(slot) => {
                slot.insert(Candle::open(swap));
            }
        }
    }
    let bucket = FineBucket {
        timestamp: key,
        baselines: last.symbols().clone(),
        candles,
    };
    debug!(bucket = key, symbols = bucket.candles.len(), "Opened fine bucket");
    fine.put(key, bucket);
    Ok(true)
}

/// Create the coarse bucket at `key` if absent. Returns true if created.
pub fn upsert_coarse_bucket(
    coarse: &mut StagedTable<'_, CoarseBucket>,
    key: i64,
    swaps: &[SwapRecord],
) -> bool {
    if coarse.contains(key) {
        return false;
    }

    let mut open_smart_price = BTreeMap::new();
    for swap in swaps {
        open_smart_price.insert(swap.code().clone(), swap.smart_price);
    }
    debug!(bucket = key, symbols = open_smart_price.len(), "Opened coarse bucket");
    coarse.put(
        key,
        CoarseBucket {
            timestamp: key,
            open_smart_price,
        },
    );
    true
}
