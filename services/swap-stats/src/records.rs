//! Persistent rows: cumulative record, fine candles, coarse references
//!
//! Each symbol's fields live together in one struct inside a single
//! symbol-keyed map, so a price without its volume cannot be stored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use types::ids::{SymbolCode, VenueId};
use types::numeric::{Amount, Symbol};
use types::swap::SwapRecord;

use crate::error::StatsError;

/// All-time statistics for one symbol at one venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolStats {
    pub volume_24h: Amount,
    pub volume_cumulative: Amount,
    pub price: f64,
    pub price_change_24h: f64,
    pub liquidity_depth: Amount,
    pub smart_price: f64,
    pub smart_price_change_30d: f64,
}

/// One row per venue, overwritten on every ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeRecord {
    pub venue: VenueId,
    /// Unix seconds of the last ingestion (not bucket aligned).
    pub timestamp: i64,
    pub symbols: BTreeMap<SymbolCode, SymbolStats>,
}

impl CumulativeRecord {
    pub fn new(venue: VenueId, timestamp: i64) -> Self {
        Self {
            venue,
            timestamp,
            symbols: BTreeMap::new(),
        }
    }

    pub fn symbol(&self, code: &SymbolCode) -> Option<&SymbolStats> {
        self.symbols.get(code)
    }
}

/// Cumulative volume and price of one symbol at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolBaseline {
    pub volume_cumulative: Amount,
    pub price: f64,
}

/// OHLC plus traded volume of one symbol inside one fine bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub volume: Amount,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// Candle opened by the first swap of a symbol in a new bucket.
    pub fn open(swap: &SwapRecord) -> Self {
        Self {
            volume: swap.quantity.clone(),
            open: swap.price,
            high: swap.price,
            low: swap.price,
            close: swap.price,
        }
    }

    /// All-zero candle used when an existing bucket has never seen the symbol.
    pub fn zeroed(symbol: Symbol) -> Self {
        Self {
            volume: Amount::zero(symbol),
            open: 0.0,
            high: 0.0,
            low: 0.0,
            close: 0.0,
        }
    }

    /// Fold one more swap into the candle. `open` never changes.
    pub fn update(&mut self, swap: &SwapRecord) -> Result<(), StatsError> {
        self.volume = self.volume.checked_add(&swap.quantity)?;
        self.high = self.high.max(swap.price);
        self.low = self.low.min(swap.price);
        self.close = swap.price;
        Ok(())
    }

    /// OHLC ordering invariants.
    pub fn is_valid(&self) -> bool {
        self.high >= self.open
            && self.high >= self.close
            && self.high >= self.low
            && self.low <= self.open
            && self.low <= self.close
    }
}

/// Fine-grained bucket backing the 24h window.
///
/// `baselines` is written once when the bucket opens and records where each
/// symbol's cumulative volume and price stood at that moment. It only holds
/// the symbols present in the opening batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineBucket {
    pub timestamp: i64,
    pub baselines: BTreeMap<SymbolCode, SymbolBaseline>,
    pub candles: BTreeMap<SymbolCode, Candle>,
}

impl FineBucket {
    pub fn candle(&self, code: &SymbolCode) -> Option<&Candle> {
        self.candles.get(code)
    }

    pub fn baseline(&self, code: &SymbolCode) -> Option<&SymbolBaseline> {
        self.baselines.get(code)
    }
}

/// Coarse-grained bucket backing the 30d window. Never modified once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoarseBucket {
    pub timestamp: i64,
    pub open_smart_price: BTreeMap<SymbolCode, f64>,
}

impl CoarseBucket {
    pub fn open_smart_price(&self, code: &SymbolCode) -> Option<f64> {
        self.open_smart_price.get(code).copied()
    }
}
