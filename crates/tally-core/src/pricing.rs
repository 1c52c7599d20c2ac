//! # Pricing Calculator
//!
//! Derives the monetary summary of an invoice from its line items, discount
//! percentage and tax percentage.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal        = Σ quantity × rate                                    │
//! │  discount_amount = round(subtotal × discount / 100)                     │
//! │  tax_amount      = round((subtotal − discount_amount) × tax / 100)      │
//! │  total           = subtotal − discount_amount + tax_amount              │
//! │                                                                         │
//! │  Tax is charged on the discounted amount, never on the gross subtotal. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding
//! Each derived amount is rounded exactly once, half away from zero, to the
//! paisa. `total` is then an exact integer sum, so the printed lines always
//! add up to the printed total.
//!
//! ## Totality
//! [`calculate`] is defined for every input: an empty item list yields all
//! zeros and out-of-range percentages are computed as given. Whether a
//! discount of 150% should be allowed is decided by the input layer
//! ([`crate::editor`]), not here.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{LineItem, Percentage};

/// The derived monetary summary of an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Totals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total: Money,
    pub item_count: usize,
}

/// Computes [`Totals`] for a list of line items.
///
/// ## Example
/// ```rust
/// use tally_core::pricing::calculate;
/// use tally_core::types::{Category, ItemId, LineItem, Percentage};
/// use tally_core::Money;
///
/// let items = vec![LineItem {
///     id: ItemId(1),
///     name: "Widget".to_string(),
///     description: None,
///     category: Category::Product,
///     quantity: 2,
///     rate: Money::from_cents(10000),
/// }];
///
/// let totals = calculate(&items, Percentage::from_percent(10), Percentage::zero());
/// assert_eq!(totals.subtotal.cents(), 20000);
/// assert_eq!(totals.discount_amount.cents(), 2000);
/// assert_eq!(totals.total.cents(), 18000);
/// ```
pub fn calculate(items: &[LineItem], discount: Percentage, tax_rate: Percentage) -> Totals {
    let subtotal: Money = items.iter().map(LineItem::line_total).sum();
    summarize(subtotal, items.len(), discount, tax_rate)
}

/// Applies discount and tax to an already-known subtotal.
///
/// Used when the line totals are frozen (persisted invoices) rather than
/// live ledger rows.
pub fn summarize(subtotal: Money, item_count: usize, discount: Percentage, tax_rate: Percentage) -> Totals {
    let discount_amount = subtotal.percentage_of(discount);
    let taxable = subtotal - discount_amount;
    let tax_amount = taxable.percentage_of(tax_rate);

    Totals {
        subtotal,
        discount_amount,
        tax_amount,
        total: taxable + tax_amount,
        item_count,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, ItemId};
    use proptest::prelude::*;

    fn line(id: u64, quantity: u32, rate_cents: i64) -> LineItem {
        LineItem {
            id: ItemId(id),
            name: format!("Item {}", id),
            description: None,
            category: Category::Product,
            quantity,
            rate: Money::from_cents(rate_cents),
        }
    }

    #[test]
    fn test_single_item_with_discount() {
        // 2 × ₹100 with 10% discount, no tax
        let totals = calculate(
            &[line(1, 2, 10000)],
            Percentage::from_percent(10),
            Percentage::zero(),
        );
        assert_eq!(totals.subtotal, Money::from_cents(20000));
        assert_eq!(totals.discount_amount, Money::from_cents(2000));
        assert_eq!(totals.tax_amount, Money::zero());
        assert_eq!(totals.total, Money::from_cents(18000));
        assert_eq!(totals.item_count, 1);
    }

    #[test]
    fn test_empty_items() {
        let totals = calculate(&[], Percentage::from_percent(10), Percentage::from_percent(18));
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn test_tax_applies_after_discount() {
        // subtotal 1000.00, 10% off = 900.00, 18% GST on 900.00 = 162.00
        let totals = calculate(
            &[line(1, 1, 100000)],
            Percentage::from_percent(10),
            Percentage::from_percent(18),
        );
        assert_eq!(totals.tax_amount.cents(), 16200);
        assert_eq!(totals.total.cents(), 106200);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // 3 × ₹33.33 = ₹99.99; 12.5% = 12.49875 → 12.50
        let totals = calculate(&[line(1, 3, 3333)], Percentage::from_bps(1250), Percentage::zero());
        assert_eq!(totals.subtotal.cents(), 9999);
        assert_eq!(totals.discount_amount.cents(), 1250);
        assert_eq!(totals.total.cents(), 8749);
    }

    #[test]
    fn test_out_of_range_discount_is_computed_as_given() {
        let totals = calculate(&[line(1, 1, 10000)], Percentage::from_percent(150), Percentage::zero());
        assert_eq!(totals.discount_amount.cents(), 15000);
        assert_eq!(totals.total.cents(), -5000);
    }

    #[test]
    fn test_extreme_input_saturates() {
        let totals = calculate(
            &[line(1, u32::MAX, i64::MAX), line(2, u32::MAX, i64::MAX)],
            Percentage::zero(),
            Percentage::from_percent(100),
        );
        assert_eq!(totals.subtotal.cents(), i64::MAX);
        assert_eq!(totals.total.cents(), i64::MAX);
    }

    #[test]
    fn test_summarize_matches_calculate() {
        let items = [line(1, 4, 2599), line(2, 1, 100001)];
        let subtotal: Money = items.iter().map(LineItem::line_total).sum();
        let discount = Percentage::from_bps(750);
        let tax = Percentage::from_bps(1800);
        assert_eq!(calculate(&items, discount, tax), summarize(subtotal, 2, discount, tax));
    }

    fn items_strategy() -> impl Strategy<Value = Vec<LineItem>> {
        prop::collection::vec((0u32..1_000, 0i64..10_000_000), 0..20).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (q, r))| line(i as u64 + 1, q, r))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_subtotal_is_exact_sum(items in items_strategy()) {
            let totals = calculate(&items, Percentage::zero(), Percentage::zero());
            let expected: i64 = items.iter().map(|i| i.quantity as i64 * i.rate.cents()).sum();
            prop_assert_eq!(totals.subtotal.cents(), expected);
        }

        #[test]
        fn prop_discount_in_range_keeps_total_non_negative(
            items in items_strategy(),
            discount_bps in 0i64..=10_000,
        ) {
            let totals = calculate(&items, Percentage::from_bps(discount_bps), Percentage::zero());
            let exact = totals.subtotal.cents() as i128 * discount_bps as i128;
            // within half a paisa of subtotal × discount / 100
            prop_assert!((totals.discount_amount.cents() as i128 * 10_000 - exact).abs() <= 5_000);
            prop_assert!(totals.total.cents() >= 0);
        }

        #[test]
        fn prop_recalculation_is_idempotent(
            items in items_strategy(),
            discount_bps in -20_000i64..20_000,
            tax_bps in 0i64..5_000,
        ) {
            let discount = Percentage::from_bps(discount_bps);
            let tax = Percentage::from_bps(tax_bps);
            prop_assert_eq!(calculate(&items, discount, tax), calculate(&items, discount, tax));
        }

        #[test]
        fn prop_total_is_sum_of_parts(
            items in items_strategy(),
            discount_bps in 0i64..=10_000,
            tax_bps in 0i64..5_000,
        ) {
            let t = calculate(&items, Percentage::from_bps(discount_bps), Percentage::from_bps(tax_bps));
            prop_assert_eq!(t.total.cents(), t.subtotal.cents() - t.discount_amount.cents() + t.tax_amount.cents());
        }
    }
}
