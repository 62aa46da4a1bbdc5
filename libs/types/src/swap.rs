//! Swap records reported by an AMM venue
//!
//! One record is emitted per hop of a conversion (or per affected reserve).
//! The producer computes all fields; this crate does no pricing math.

use serde::{Deserialize, Serialize};

use crate::ids::SymbolCode;
use crate::numeric::{Amount, Symbol};

/// A single swap data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRecord {
    /// Signed traded quantity; its symbol identifies the record.
    pub quantity: Amount,
    /// Effective rate for this hop.
    pub price: f64,
    /// Post-trade reserve balance of the output asset.
    pub liquidity_depth: Amount,
    /// Derived index price tracked for longer-horizon drift.
    pub smart_price: f64,
}

impl SwapRecord {
    pub fn new(quantity: Amount, price: f64, liquidity_depth: Amount, smart_price: f64) -> Self {
        Self {
            quantity,
            price,
            liquidity_depth,
            smart_price,
        }
    }

    /// Symbol code this record reports on.
    pub fn code(&self) -> &SymbolCode {
        self.quantity.code()
    }

    pub fn symbol(&self) -> &Symbol {
        self.quantity.symbol()
    }

    /// Whether both prices are finite numbers.
    pub fn has_finite_prices(&self) -> bool {
        self.price.is_finite() && self.smart_price.is_finite()
    }
}
