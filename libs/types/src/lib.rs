//! Types library for AMM swap statistics
//!
//! Shared type definitions used by the swap statistics service and by the
//! producers that report swaps into it.
//!
//! # Modules
//! - `ids`: Identifiers (VenueId, OperatorId, SymbolCode)
//! - `numeric`: Symbol-tagged fixed-point amounts (Symbol, Amount)
//! - `swap`: Swap records emitted by an AMM venue
//! - `errors`: Error taxonomy

pub mod ids;
pub mod numeric;
pub mod swap;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::swap::*;
    pub use crate::errors::*;
}
