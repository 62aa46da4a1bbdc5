//! Last-known state per symbol before a batch is applied

use std::collections::BTreeMap;

use types::ids::SymbolCode;
use types::numeric::Amount;
use types::swap::SwapRecord;

use crate::baseline::DayBaseline;
use crate::records::{CumulativeRecord, SymbolBaseline};

/// Cumulative volume and reference price of every symbol in a batch, as
/// they stood before the batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LastState {
    symbols: BTreeMap<SymbolCode, SymbolBaseline>,
}

impl LastState {
    /// Resolve continuity for each distinct symbol of `swaps`.
    ///
    /// Volume comes from the cumulative record, else the day baseline, else
    /// zero. Price is the incoming swap's price; when a symbol repeats, the
    /// first-seen volume stays and the last occurrence's price wins.
    pub fn resolve(
        record: Option<&CumulativeRecord>,
        day: &DayBaseline,
        swaps: &[SwapRecord],
    ) -> Self {
        let mut symbols: BTreeMap<SymbolCode, SymbolBaseline> = BTreeMap::new();
        for swap in swaps {
            let code = swap.code();
            if let Some(existing) = symbols.get_mut(code) {
                existing.price = swap.price;
                continue;
            }
            let volume_cumulative = record
                .and_then(|r| r.symbol(code))
                .map(|stats| stats.volume_cumulative.clone())
                .or_else(|| day.volume_cumulative(code).cloned())
                .unwrap_or_else(|| Amount::zero(swap.symbol().clone()));
            symbols.insert(
                code.clone(),
                SymbolBaseline {
                    volume_cumulative,
                    price: swap.price,
                },
            );
        }
        Self { symbols }
    }

    pub fn get(&self, code: &SymbolCode) -> Option<&SymbolBaseline> {
        self.symbols.get(code)
    }

    pub fn symbols(&self) -> &BTreeMap<SymbolCode, SymbolBaseline> {
        &self.symbols
    }
}
