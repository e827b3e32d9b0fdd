//! Validated monetary amounts.
//!
//! Every amount crossing the CLI or HTTP boundary is parsed into [`Money`]
//! once; arithmetic downstream never sees a malformed number.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use crate::error::{Result, ShopError};

const CENTS: u32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// `Money::new(1550, 2)` is 15.50.
    pub fn new(num: i64, scale: u32) -> Self {
        Money(Decimal::new(num, scale))
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Money(value)
    }

    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, CENTS))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Parse user or wire input, rejecting blanks and anything non-numeric.
    pub fn parse(field: &str, text: &str) -> Result<Money> {
        let trimmed = text.trim();
        Decimal::from_str(trimmed)
            .map(Money)
            .map_err(|_| ShopError::InvalidNumber {
                field: field.to_string(),
                value: text.to_string(),
            })
    }

    /// Like [`Money::parse`], but blank input means "no value".
    pub fn parse_optional(field: &str, text: &str) -> Result<Option<Money>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        Money::parse(field, text).map(Some)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Round half away from zero to whole cents.
    pub fn round_cents(self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(CENTS, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Split into `parts` equal shares rounded to cents. `None` when `parts` is zero.
    pub fn share(self, parts: usize) -> Option<Money> {
        if parts == 0 {
            return None;
        }
        Some(Money(self.0 / Decimal::from(parts)).round_cents())
    }

    /// `self * times`, or `None` past the representable range.
    pub fn checked_times(self, times: usize) -> Option<Money> {
        self.0.checked_mul(Decimal::from(times)).map(Money)
    }

    /// Two decimals with thousands separators, e.g. `12,500.00`.
    pub fn grouped(&self) -> String {
        let rounded = format!("{:.2}", self.round_cents().0);
        let (whole, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
        let negative = whole.starts_with('-');
        let digits = whole.trim_start_matches('-');

        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        let grouped: String = out.chars().rev().collect();

        if negative {
            format!("-{grouped}.{frac}")
        } else {
            format!("{grouped}.{frac}")
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.round_cents().0)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_blank_and_garbage() {
        assert!(Money::parse("amount", "").is_err());
        assert!(Money::parse("amount", "   ").is_err());
        assert!(Money::parse("amount", "NaN").is_err());
        assert!(Money::parse("amount", "12abc").is_err());
        assert_eq!(Money::parse("amount", " 130.50 ").unwrap(), Money::new(13050, 2));
    }

    #[test]
    fn parse_optional_treats_blank_as_none() {
        assert_eq!(Money::parse_optional("tip", "").unwrap(), None);
        assert_eq!(Money::parse_optional("tip", "5").unwrap(), Some(Money::new(5, 0)));
        assert!(Money::parse_optional("tip", "five").is_err());
    }

    #[test]
    fn share_rounds_to_cents() {
        assert_eq!(Money::new(10, 0).share(3), Some(Money::new(333, 2)));
        assert_eq!(Money::new(20, 0).share(3), Some(Money::new(667, 2)));
        assert_eq!(Money::new(30, 0).share(2), Some(Money::new(15, 0)));
        assert_eq!(Money::new(30, 0).share(0), None);
    }

    #[test]
    fn large_amounts_stay_exact() {
        let big = Money::new(100_000_000_000_000_000, 0);
        assert_eq!(big.share(2), Some(Money::new(50_000_000_000_000_000, 0)));
        assert_eq!(big.checked_times(3), Some(Money::new(300_000_000_000_000_000, 0)));
        assert_eq!(Money::from_decimal(Decimal::MAX).checked_times(2), None);
    }

    #[test]
    fn grouped_formatting() {
        assert_eq!(Money::new(125000, 2).grouped(), "1,250.00");
        assert_eq!(Money::new(-98765432, 2).grouped(), "-987,654.32");
        assert_eq!(Money::new(5, 1).grouped(), "0.50");
    }

    #[test]
    fn deserializes_decimal_strings_from_the_wire() {
        let value: Money = serde_json::from_str("\"150.00\"").unwrap();
        assert_eq!(value, Money::new(150, 0));
        assert_eq!(value.to_string(), "150.00");
    }
}
