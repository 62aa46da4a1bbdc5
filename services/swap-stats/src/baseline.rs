//! Day and month baseline resolution
//!
//! The oldest retained bucket of a retention class is the reference point
//! for that class's windowed delta. When a venue has no retained bucket a
//! neutral baseline is synthesized from the incoming batch so every delta
//! comes out as zero.

use std::collections::BTreeMap;

use types::ids::SymbolCode;
use types::numeric::Amount;
use types::swap::SwapRecord;

use crate::config::Resolution;
use crate::records::{CoarseBucket, FineBucket, SymbolBaseline};
use crate::retention::prune_on_new_bucket;
use crate::store::StagedTable;

/// Reference point for the 24h window.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBaseline {
    pub timestamp: i64,
    pub symbols: BTreeMap<SymbolCode, SymbolBaseline>,
    /// True when no fine bucket was retained.
    pub synthesized: bool,
}

impl DayBaseline {
    fn from_bucket(bucket: &FineBucket) -> Self {
        Self {
            timestamp: bucket.timestamp,
            symbols: bucket.baselines.clone(),
            synthesized: false,
        }
    }

    /// Zero volume, current price. A repeated symbol takes its last price.
    fn synthesize(timestamp: i64, swaps: &[SwapRecord]) -> Self {
        let mut symbols = BTreeMap::new();
        for swap in swaps {
            symbols.insert(
                swap.code().clone(),
                SymbolBaseline {
                    volume_cumulative: Amount::zero(swap.symbol().clone()),
                    price: swap.price,
                },
            );
        }
        Self {
            timestamp,
            symbols,
            synthesized: true,
        }
    }

    pub fn volume_cumulative(&self, code: &SymbolCode) -> Option<&Amount> {
        self.symbols.get(code).map(|b| &b.volume_cumulative)
    }

    pub fn price(&self, code: &SymbolCode) -> Option<f64> {
        self.symbols.get(code).map(|b| b.price)
    }
}

/// Reference point for the 30d window.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthBaseline {
    pub timestamp: i64,
    pub open_smart_price: BTreeMap<SymbolCode, f64>,
    /// True when no coarse bucket was retained.
    pub synthesized: bool,
}

impl MonthBaseline {
    fn from_bucket(bucket: &CoarseBucket) -> Self {
        Self {
            timestamp: bucket.timestamp,
            open_smart_price: bucket.open_smart_price.clone(),
            synthesized: false,
        }
    }

    fn synthesize(timestamp: i64, swaps: &[SwapRecord]) -> Self {
        let mut open_smart_price = BTreeMap::new();
        for swap in swaps {
            open_smart_price.insert(swap.code().clone(), swap.smart_price);
        }
        Self {
            timestamp,
            open_smart_price,
            synthesized: true,
        }
    }

    pub fn open_smart_price(&self, code: &SymbolCode) -> Option<f64> {
        self.open_smart_price.get(code).copied()
    }
}

/// A resolved baseline and the number of buckets pruned to find it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<B> {
    pub baseline: B,
    pub pruned: usize,
}

pub fn resolve_day_baseline(
    fine: &mut StagedTable<'_, FineBucket>,
    resolution: &Resolution,
    now: i64,
    swaps: &[SwapRecord],
) -> Resolved<DayBaseline> {
    let pruned = prune_on_new_bucket(fine, resolution, now);
    let baseline = match fine.first() {
        Some((_, bucket)) => DayBaseline::from_bucket(bucket),
        None => DayBaseline::synthesize(resolution.bucket_start(now), swaps),
    };
    Resolved { baseline, pruned }
}

pub fn resolve_month_baseline(
    coarse: &mut StagedTable<'_, CoarseBucket>,
    resolution: &Resolution,
    now: i64,
    swaps: &[SwapRecord],
) -> Resolved<MonthBaseline> {
    let pruned = prune_on_new_bucket(coarse, resolution, now);
    let baseline = match coarse.first() {
        Some((_, bucket)) => MonthBaseline::from_bucket(bucket),
        None => MonthBaseline::synthesize(resolution.bucket_start(now), swaps),
    };
    Resolved { baseline, pruned }
}
