//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  An invoice with 3 × ₹33.33 and a 7.5% discount drifts by a paisa      │
//! │  depending on evaluation order.                                         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paise)                              │
//! │    Every amount is an i64 count of paise. Rounding happens exactly     │
//! │    once per derived amount, with a documented rule.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Presentation
//! Formatting (Indian digit grouping, two fraction digits, rupee sign) lives
//! here too so the authoring UI and the printed document share exactly one
//! formatting function. Formatted strings are never fed back into arithmetic
//! except through [`Money::parse`].
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let rate = Money::parse("1250.5").unwrap();
//! assert_eq!(rate.cents(), 125050);
//!
//! let line = rate.multiply_quantity(100);
//! assert_eq!(line.format_amount(), "1,25,050.00");
//! assert_eq!(line.format_currency(), "₹1,25,050.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::Percentage;

/// Currency sign used by [`Money::format_currency`].
pub const CURRENCY_SYMBOL: &str = "₹";

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (paise).
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts and permissive out-of-range percentages can
///   produce negative amounts; they must be representable, not panic
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Saturating arithmetic**: a pathological draft saturates instead of
///   overflowing
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  LineItem.rate ──► LineItem.line_total ──► Totals.subtotal              │
/// │                                               │                         │
/// │                     discount ─────────────────┤                         │
/// │                     tax ──────────────────────┤                         │
/// │                                               ▼                         │
/// │                                         Totals.total                    │
/// │                                               │                         │
/// │              format_amount() ◄────────────────┘ (UI + PDF)              │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from rupees and paise.
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -₹5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit rate by an item quantity.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let rate = Money::from_cents(299);
    /// assert_eq!(rate.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0.saturating_mul(qty as i64))
    }

    /// Applies a percentage and returns the resulting portion.
    ///
    /// ## Rounding
    /// `amount × bps / 10000`, rounded half away from zero to the paisa.
    /// Intermediate math is i128; the result saturates into i64.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::Percentage;
    ///
    /// let subtotal = Money::from_cents(1000);          // ₹10.00
    /// let tax = subtotal.percentage_of(Percentage::from_bps(825)); // 8.25%
    /// assert_eq!(tax.cents(), 83);                      // 82.5 → 83
    /// ```
    pub fn percentage_of(&self, pct: Percentage) -> Money {
        let product = self.0 as i128 * pct.bps() as i128;
        Money(saturate(div_round_half_away(product, 10_000)))
    }

    /// Parses a decimal amount such as `"1250.5"`, `"₹1,250.50"` or `"-3"`.
    ///
    /// ## Rules
    /// - Optional leading `-`, optional rupee sign, digit-grouping commas ignored
    /// - More than two fraction digits are rounded half away from zero
    /// - Anything else is an `InvalidFormat` error
    pub fn parse(raw: &str) -> Result<Money, ValidationError> {
        parse_scaled(raw, "amount").map(Money)
    }

    /// Formats the amount with Indian digit grouping and two decimals.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(12345678).format_amount(), "1,23,456.78");
    /// assert_eq!(Money::from_cents(-50).format_amount(), "-0.50");
    /// ```
    pub fn format_amount(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!(
            "{}{}.{:02}",
            sign,
            group_indian(&(abs / 100).to_string()),
            abs % 100
        )
    }

    /// Plain decimal rupees for machine consumers, e.g. `123456.78`.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }

    /// Formats the amount with the currency sign, e.g. `₹1,23,456.78`.
    pub fn format_currency(&self) -> String {
        let formatted = self.format_amount();
        match formatted.strip_prefix('-') {
            Some(rest) => format!("-{}{}", CURRENCY_SYMBOL, rest),
            None => format!("{}{}", CURRENCY_SYMBOL, formatted),
        }
    }
}

// =============================================================================
// Decimal Helpers
// =============================================================================

/// Parses a decimal string into an integer scaled by 100.
///
/// Shared by [`Money::parse`] (paise) and `Percentage::parse` (basis points).
pub(crate) fn parse_scaled(raw: &str, field: &str) -> Result<i64, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let body = body.strip_prefix(CURRENCY_SYMBOL).unwrap_or(body);
    let body: String = body.chars().filter(|c| *c != ',').collect();

    let (int_part, frac_part) = match body.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (body.as_str(), ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid("must be a number"));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("must be a number"));
    }

    let major: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| invalid("is too large"))?
    };

    let mut frac = frac_part.bytes().map(|b| (b - b'0') as i64);
    let tenths = frac.next().unwrap_or(0);
    let hundredths = frac.next().unwrap_or(0);
    let round_up = frac.next().map(|d| d >= 5).unwrap_or(false);
    let minor = tenths * 10 + hundredths + i64::from(round_up);

    let scaled = major
        .checked_mul(100)
        .and_then(|v| v.checked_add(minor))
        .ok_or_else(|| invalid("is too large"))?;

    Ok(if negative { -scaled } else { scaled })
}

/// Integer division rounding half away from zero.
pub(crate) fn div_round_half_away(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator.abs() {
        if (numerator < 0) != (denominator < 0) {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    }
}

pub(crate) fn saturate(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Groups digits the Indian way: last three, then pairs (`12,34,567`).
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (front, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = front;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_currency())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_parse_plain_and_grouped() {
        assert_eq!(Money::parse("100").unwrap().cents(), 10000);
        assert_eq!(Money::parse("12.5").unwrap().cents(), 1250);
        assert_eq!(Money::parse(".75").unwrap().cents(), 75);
        assert_eq!(Money::parse("₹1,23,456.78").unwrap().cents(), 12345678);
        assert_eq!(Money::parse("-₹0.50").unwrap().cents(), -50);
        assert_eq!(Money::parse("  42  ").unwrap().cents(), 4200);
    }

    #[test]
    fn test_parse_rounds_extra_fraction_digits() {
        assert_eq!(Money::parse("0.125").unwrap().cents(), 13);
        assert_eq!(Money::parse("0.124").unwrap().cents(), 12);
        assert_eq!(Money::parse("-0.125").unwrap().cents(), -13);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse("1e5").is_err());
        assert!(Money::parse(".").is_err());
        assert!(Money::parse("99999999999999999999").is_err());
    }

    #[test]
    fn test_decimal_string() {
        assert_eq!(Money::from_cents(12345678).to_decimal_string(), "123456.78");
        assert_eq!(Money::from_cents(5).to_decimal_string(), "0.05");
        assert_eq!(Money::from_cents(-2000).to_decimal_string(), "-20.00");
    }

    #[test]
    fn test_format_amount_indian_grouping() {
        assert_eq!(Money::from_cents(0).format_amount(), "0.00");
        assert_eq!(Money::from_cents(99900).format_amount(), "999.00");
        assert_eq!(Money::from_cents(100000).format_amount(), "1,000.00");
        assert_eq!(Money::from_cents(10000000).format_amount(), "1,00,000.00");
        assert_eq!(Money::from_cents(1234567891).format_amount(), "1,23,45,678.91");
        assert_eq!(Money::from_cents(-2000).format_amount(), "-20.00");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(Money::from_cents(18000).format_currency(), "₹180.00");
        assert_eq!(Money::from_cents(-550).format_currency(), "-₹5.50");
        assert_eq!(format!("{}", Money::from_cents(5)), "₹0.05");
    }

    #[test]
    fn test_formatted_amount_parses_back() {
        for cents in [0, 1, 99, 100_000, 12_345_678, -987_654] {
            let money = Money::from_cents(cents);
            assert_eq!(Money::parse(&money.format_currency()).unwrap(), money);
        }
    }

    #[test]
    fn test_percentage_of_rounds_half_away_from_zero() {
        let amount = Money::from_cents(1000);
        assert_eq!(amount.percentage_of(Percentage::from_bps(825)).cents(), 83);
        assert_eq!(amount.percentage_of(Percentage::from_bps(1000)).cents(), 100);

        let negative = Money::from_cents(-1000);
        assert_eq!(negative.percentage_of(Percentage::from_bps(825)).cents(), -83);
    }

    #[test]
    fn test_saturating_arithmetic_never_panics() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!((max + Money::from_cents(1)).cents(), i64::MAX);
        assert_eq!(max.multiply_quantity(u32::MAX).cents(), i64::MAX);
        assert_eq!(max.percentage_of(Percentage::from_bps(i64::MAX)).cents(), i64::MAX);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 650].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 1000);
    }
}
