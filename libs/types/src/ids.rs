//! Identifier types for venues, operators, and traded symbols
//!
//! Venues and operators are named accounts. Symbol codes follow the
//! on-chain token convention of 1-7 uppercase ASCII letters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::IdError;

const MAX_NAME_LEN: usize = 64;
const MAX_SYMBOL_LEN: usize = 7;

fn is_valid_name(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_NAME_LEN
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Identity of one AMM venue (converter).
///
/// All aggregated state is partitioned by this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VenueId(String);

impl VenueId {
    /// Create a new VenueId
    ///
    /// # Panics
    /// Panics if the name is empty or contains characters outside
    /// `[A-Za-z0-9._-]`
    pub fn new(name: impl Into<String>) -> Self {
        let s = name.into();
        assert!(is_valid_name(&s), "VenueId must be a non-empty account name");
        Self(s)
    }

    /// Try to create a VenueId, returning None if invalid
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let s = name.into();
        if is_valid_name(&s) {
            Some(Self(s))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VenueId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_new(s).ok_or_else(|| IdError::InvalidVenue(s.to_string()))
    }
}

impl From<&str> for VenueId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl TryFrom<String> for VenueId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if is_valid_name(&s) {
            Ok(Self(s))
        } else {
            Err(IdError::InvalidVenue(s))
        }
    }
}

impl From<VenueId> for String {
    fn from(venue: VenueId) -> Self {
        venue.0
    }
}

/// Identity of the operator running the statistics service itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OperatorId(String);

impl OperatorId {
    /// # Panics
    /// Panics under the same rules as [`VenueId::new`]
    pub fn new(name: impl Into<String>) -> Self {
        let s = name.into();
        assert!(is_valid_name(&s), "OperatorId must be a non-empty account name");
        Self(s)
    }

    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let s = name.into();
        if is_valid_name(&s) {
            Some(Self(s))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OperatorId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_new(s).ok_or_else(|| IdError::InvalidOperator(s.to_string()))
    }
}

impl TryFrom<String> for OperatorId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if is_valid_name(&s) {
            Ok(Self(s))
        } else {
            Err(IdError::InvalidOperator(s))
        }
    }
}

impl From<OperatorId> for String {
    fn from(operator: OperatorId) -> Self {
        operator.0
    }
}

/// Token symbol code (e.g. "TLOS", "USDT").
///
/// Ordered so per-symbol maps iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SymbolCode(String);

impl SymbolCode {
    pub fn try_new(code: impl Into<String>) -> Result<Self, IdError> {
        let s = code.into();
        let valid = !s.is_empty()
            && s.len() <= MAX_SYMBOL_LEN
            && s.chars().all(|c| c.is_ascii_uppercase());
        if valid {
            Ok(Self(s))
        } else {
            Err(IdError::InvalidSymbolCode(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SymbolCode {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_new(s)
    }
}

impl TryFrom<String> for SymbolCode {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::try_new(s)
    }
}

impl From<SymbolCode> for String {
    fn from(code: SymbolCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venue_id_creation() {
        let venue = VenueId::new("venueA");
        assert_eq!(venue.as_str(), "venueA");
        assert_eq!(venue.to_string(), "venueA");
    }

    #[test]
    fn test_venue_id_try_new() {
        assert!(VenueId::try_new("tlosconvert1").is_some());
        assert!(VenueId::try_new("").is_none());
        assert!(VenueId::try_new("bad venue").is_none());
    }

    #[test]
    #[should_panic(expected = "VenueId must be a non-empty account name")]
    fn test_venue_id_invalid_panics() {
        VenueId::new("");
    }

    #[test]
    fn test_venue_id_serialization() {
        let venue = VenueId::new("venueA");
        let json = serde_json::to_string(&venue).unwrap();
        assert_eq!(json, "\"venueA\"");

        let deserialized: VenueId = serde_json::from_str(&json).unwrap();
        assert_eq!(venue, deserialized);
    }

    #[test]
    fn test_account_ids_reject_invalid_json() {
        assert!(serde_json::from_str::<VenueId>("\"\"").is_err());
        assert!(serde_json::from_str::<VenueId>("\"bad venue\"").is_err());
        assert!(serde_json::from_str::<OperatorId>("\"\"").is_err());

        let op: OperatorId = serde_json::from_str("\"swapsdata\"").unwrap();
        assert_eq!(serde_json::to_string(&op).unwrap(), "\"swapsdata\"");
    }

    #[test]
    fn test_operator_id_from_str() {
        let op: OperatorId = "swapsdata".parse().unwrap();
        assert_eq!(op.as_str(), "swapsdata");
        assert!("".parse::<OperatorId>().is_err());
    }

    #[test]
    fn test_symbol_code_validation() {
        assert!(SymbolCode::try_new("TLOS").is_ok());
        assert!(SymbolCode::try_new("USDT").is_ok());
        assert_eq!(
            SymbolCode::try_new("tlos"),
            Err(IdError::InvalidSymbolCode("tlos".to_string()))
        );
        assert!(SymbolCode::try_new("TOOLONGX").is_err());
        assert!(SymbolCode::try_new("").is_err());
    }

    #[test]
    fn test_symbol_code_rejects_invalid_json() {
        let result: Result<SymbolCode, _> = serde_json::from_str("\"eos\"");
        assert!(result.is_err());
    }
}
