//! Symbol-tagged fixed-point amounts
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Every amount carries its symbol (code + precision); arithmetic across
//! different symbols is rejected rather than silently coerced.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AmountError;
use crate::ids::SymbolCode;

/// Maximum supported number of fractional digits.
pub const MAX_PRECISION: u8 = 18;

/// A token symbol: code plus decimal precision (e.g. `4,TLOS`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    pub code: SymbolCode,
    pub precision: u8,
}

impl Symbol {
    pub fn new(code: SymbolCode, precision: u8) -> Result<Self, AmountError> {
        if precision > MAX_PRECISION {
            return Err(AmountError::PrecisionTooLarge(precision as u32));
        }
        Ok(Self { code, precision })
    }

    /// Parse from `"<code>"` and `<precision>` parts.
    pub fn parse(code: &str, precision: u8) -> Result<Self, AmountError> {
        Self::new(SymbolCode::try_new(code)?, precision)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

/// Signed fixed-point quantity of one symbol.
///
/// Serialized in its textual form, e.g. `"10.0000 TLOS"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount {
    value: Decimal,
    symbol: Symbol,
}

impl Amount {
    /// Create an amount, rounding `value` (half away from zero) to the
    /// symbol's precision.
    pub fn new(value: Decimal, symbol: Symbol) -> Self {
        let dp = symbol.precision as u32;
        let mut value = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(dp);
        Self { value, symbol }
    }

    /// Zero amount of the given symbol.
    pub fn zero(symbol: Symbol) -> Self {
        Self::new(Decimal::ZERO, symbol)
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn code(&self) -> &SymbolCode {
        &self.symbol.code
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Add two amounts of the same symbol.
    pub fn checked_add(&self, other: &Amount) -> Result<Amount, AmountError> {
        self.ensure_same_symbol(other)?;
        let value = self
            .value
            .checked_add(other.value)
            .ok_or(AmountError::Overflow)?;
        Ok(Amount::new(value, self.symbol.clone()))
    }

    /// Subtract an amount of the same symbol.
    pub fn checked_sub(&self, other: &Amount) -> Result<Amount, AmountError> {
        self.ensure_same_symbol(other)?;
        let value = self
            .value
            .checked_sub(other.value)
            .ok_or(AmountError::Overflow)?;
        Ok(Amount::new(value, self.symbol.clone()))
    }

    fn ensure_same_symbol(&self, other: &Amount) -> Result<(), AmountError> {
        if self.symbol != other.symbol {
            return Err(AmountError::SymbolMismatch {
                left: self.symbol.to_string(),
                right: other.symbol.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.prec$} {}",
            self.value,
            self.symbol.code,
            prec = self.symbol.precision as usize
        )
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse `"<value> <CODE>"`; precision is the number of fractional
    /// digits written in `<value>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AmountError::Malformed(s.to_string());

        let (number, code) = s.trim().split_once(' ').ok_or_else(malformed)?;
        let digits = number.strip_prefix(['-', '+']).unwrap_or(number);
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) if !f.is_empty() => (i, f),
            Some(_) => return Err(malformed()),
            None => (digits, ""),
        };
        if int_part.is_empty()
            || !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(malformed());
        }

        let precision = u8::try_from(frac_part.len())
            .map_err(|_| AmountError::PrecisionTooLarge(frac_part.len() as u32))?;
        let symbol = Symbol::parse(code, precision)?;
        let value = Decimal::from_str(number.trim_start_matches('+')).map_err(|_| malformed())?;

        Ok(Amount::new(value, symbol))
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tlos() -> Symbol {
        Symbol::parse("TLOS", 4).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        let amount: Amount = "10.0000 TLOS".parse().unwrap();
        assert_eq!(amount.value(), Decimal::new(100_000, 4));
        assert_eq!(amount.symbol(), &tlos());
        assert_eq!(amount.to_string(), "10.0000 TLOS");
    }

    #[test]
    fn test_parse_negative_and_integer_amounts() {
        let neg: Amount = "-2.50 USD".parse().unwrap();
        assert_eq!(neg.value(), Decimal::new(-250, 2));
        assert_eq!(neg.symbol().precision, 2);

        let whole: Amount = "7 NUT".parse().unwrap();
        assert_eq!(whole.symbol().precision, 0);
        assert_eq!(whole.to_string(), "7 NUT");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("10.0000".parse::<Amount>().is_err());
        assert!("10. TLOS".parse::<Amount>().is_err());
        assert!("1x.00 TLOS".parse::<Amount>().is_err());
        assert!("1.00 tlos".parse::<Amount>().is_err());
    }

    #[test]
    fn test_new_rounds_to_precision() {
        let amount = Amount::new(Decimal::new(123_455, 5), tlos());
        assert_eq!(amount.to_string(), "1.2346 TLOS");
    }

    #[test]
    fn test_zero_display_keeps_precision() {
        assert_eq!(Amount::zero(tlos()).to_string(), "0.0000 TLOS");
    }

    #[test]
    fn test_checked_add_and_sub() {
        let a: Amount = "10.0000 TLOS".parse().unwrap();
        let b: Amount = "2.5000 TLOS".parse().unwrap();
        assert_eq!(a.checked_add(&b).unwrap().to_string(), "12.5000 TLOS");
        assert_eq!(b.checked_sub(&a).unwrap().to_string(), "-7.5000 TLOS");
    }

    #[test]
    fn test_symbol_mismatch_rejected() {
        let a: Amount = "10.0000 TLOS".parse().unwrap();
        let other_code: Amount = "1.0000 USDT".parse().unwrap();
        let other_precision: Amount = "1.00 TLOS".parse().unwrap();

        assert!(matches!(
            a.checked_add(&other_code),
            Err(AmountError::SymbolMismatch { .. })
        ));
        assert!(matches!(
            a.checked_sub(&other_precision),
            Err(AmountError::SymbolMismatch { .. })
        ));
    }

    #[test]
    fn test_amount_json_is_textual() {
        let amount: Amount = "1000.0000 TLOS".parse().unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"1000.0000 TLOS\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }

    proptest! {
        #[test]
        fn add_then_sub_is_identity(a in -1_000_000_000i64..1_000_000_000, b in -1_000_000_000i64..1_000_000_000) {
            let x = Amount::new(Decimal::new(a, 4), tlos());
            let y = Amount::new(Decimal::new(b, 4), tlos());
            let restored = x.checked_add(&y).unwrap().checked_sub(&y).unwrap();
            prop_assert_eq!(restored, x);
        }
    }
}
