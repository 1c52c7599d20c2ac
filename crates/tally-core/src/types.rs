//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │  InvoiceDraft   │   │     Invoice     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (ItemId)    │   │  customer       │   │  id (UUID)      │       │
//! │  │  name           │   │  invoice_date   │   │  invoice_number │       │
//! │  │  category       │   │  discount, tax  │   │  status         │       │
//! │  │  quantity, rate │   │  ledger         │   │  frozen items   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   Percentage    │   │ InvoiceSnapshot │  ← what the renderer sees   │
//! │  │  bps (i64)      │   │  immutable copy │                             │
//! │  │  1000 = 10%     │   └─────────────────┘                             │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A persisted invoice has:
//! - `id`: UUID v4 - immutable, used for lookups and the PDF route
//! - `invoice_number`: human-readable, assigned by the repository

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::ledger::Ledger;
use crate::money::{parse_scaled, Money};
use crate::pricing::Totals;
use crate::status::InvoiceStatus;

// =============================================================================
// Percentage
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so `12.5%` is `1250` and every
/// discount or tax rate a user can type with two decimals is exact.
///
/// ## Range
/// Signed and unbounded on purpose: the calculator tolerates whatever reaches
/// it. Clamping to a sane range is the input layer's job
/// (see [`crate::editor`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(i64);

impl Percentage {
    /// 100%.
    pub const FULL: Percentage = Percentage(10_000);

    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: i64) -> Self {
        Percentage(bps)
    }

    /// Creates a percentage from a whole number of percent.
    #[inline]
    pub const fn from_percent(pct: i64) -> Self {
        Percentage(pct * 100)
    }

    /// Parses a decimal percentage such as `"12.5"`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        parse_scaled(raw, "percentage").map(Percentage)
    }

    /// Returns the value in basis points.
    #[inline]
    pub const fn bps(&self) -> i64 {
        self.0
    }

    /// Zero percent.
    #[inline]
    pub const fn zero() -> Self {
        Percentage(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Clamps into `[min, max]`.
    pub fn clamp(self, min: Percentage, max: Percentage) -> Self {
        Percentage(self.0.clamp(min.0, max.0))
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Percentage::zero()
    }
}

impl Percentage {
    /// Decimal percentage without the sign, e.g. `12.5` for 12.5%.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / 100;
        let frac = abs % 100;
        if frac == 0 {
            format!("{}{}", sign, whole)
        } else if frac % 10 == 0 {
            format!("{}{}.{}", sign, whole, frac / 10)
        } else {
            format!("{}{}.{:02}", sign, whole, frac)
        }
    }
}

/// Displays without trailing zeros: `10%`, `12.5%`, `8.25%`.
impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.to_decimal_string())
    }
}

// =============================================================================
// Category
// =============================================================================

/// Line-item category offered by the authoring form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Category {
    #[default]
    Product,
    Service,
    Consulting,
    Software,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Product,
        Category::Service,
        Category::Consulting,
        Category::Software,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Product => "Product",
            Category::Service => "Service",
            Category::Consulting => "Consulting",
            Category::Software => "Software",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: Category::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// Identity of a line item, stable within one editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A line on an invoice draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub quantity: u32,
    /// Unit rate in paise.
    pub rate: Money,
}

impl LineItem {
    /// `quantity × rate`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.rate.multiply_quantity(self.quantity)
    }

    /// Whether the item may be submitted: named, quantity > 0, rate > 0.
    pub fn qualifies(&self) -> bool {
        !self.name.trim().is_empty() && self.quantity > 0 && self.rate.is_positive()
    }
}

/// Field values for a new line item (identity is assigned by the ledger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Category,
    pub quantity: u32,
    pub rate: Money,
}

impl NewLineItem {
    /// The blank row the authoring form starts with.
    pub fn blank() -> Self {
        NewLineItem {
            name: String::new(),
            description: None,
            category: Category::Product,
            quantity: 1,
            rate: Money::zero(),
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Customer block. Only the name is required; contact fields are free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl Customer {
    /// Non-empty contact lines in display order (email, phone, address lines).
    pub fn contact_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for field in [&self.email, &self.phone] {
            if let Some(value) = field.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                lines.push(value.to_string());
            }
        }
        if let Some(address) = &self.address {
            lines.extend(
                address
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string),
            );
        }
        lines
    }
}

/// Normalizes optional free text: blank becomes `None`.
pub fn non_blank(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

// =============================================================================
// Invoice Draft
// =============================================================================

/// Everything the authoring form holds before submission.
///
/// Owned by exactly one editing session; mutated only through
/// [`crate::editor::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub customer: Customer,
    pub invoice_date: NaiveDate,
    pub discount: Percentage,
    pub tax_rate: Percentage,
    pub notes: String,
    pub ledger: Ledger,
}

impl InvoiceDraft {
    /// A fresh draft dated `today` with one blank line item.
    pub fn new(today: NaiveDate) -> Self {
        InvoiceDraft {
            customer: Customer::default(),
            invoice_date: today,
            discount: Percentage::zero(),
            tax_rate: Percentage::zero(),
            notes: String::new(),
            ledger: Ledger::with_blank_item(),
        }
    }
}

// =============================================================================
// Invoice (persisted)
// =============================================================================

/// A line frozen at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceItem {
    /// Ledger identity the line had in the editing session.
    pub item_id: u64,
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub quantity: u32,
    pub rate: Money,
    pub total: Money,
}

impl From<&LineItem> for InvoiceItem {
    fn from(item: &LineItem) -> Self {
        InvoiceItem {
            item_id: item.id.0,
            name: item.name.trim().to_string(),
            description: item.description.clone().and_then(non_blank),
            category: item.category,
            quantity: item.quantity,
            rate: item.rate,
            total: item.line_total(),
        }
    }
}

/// An invoice record as the repository stores it.
///
/// Items, discount and totals are frozen; only `status` changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    #[ts(as = "String")]
    pub id: Uuid,
    pub invoice_number: String,
    pub customer: Customer,
    #[ts(as = "String")]
    pub invoice_date: NaiveDate,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub items: Vec<InvoiceItem>,
    pub discount: Percentage,
    pub discount_amount: Money,
    pub tax_rate: Percentage,
    pub tax_amount: Money,
    pub subtotal: Money,
    pub total: Money,
    pub notes: Option<String>,
    pub status: InvoiceStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Totals as captured at submission.
    pub fn totals(&self) -> Totals {
        Totals {
            subtotal: self.subtotal,
            discount_amount: self.discount_amount,
            tax_amount: self.tax_amount,
            total: self.total,
            item_count: self.items.len(),
        }
    }

    /// Immutable copy handed to the document renderer.
    pub fn snapshot(&self) -> InvoiceSnapshot {
        InvoiceSnapshot {
            invoice_number: self.invoice_number.clone(),
            status: self.status,
            invoice_date: self.invoice_date,
            due_date: Some(self.due_date),
            customer: self.customer.clone(),
            items: self.items.clone(),
            discount: self.discount,
            tax_rate: self.tax_rate,
            totals: self.totals(),
            notes: self.notes.clone(),
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Immutable invoice data taken at submission or render time.
///
/// The renderer refuses a snapshot whose invoice number or customer name is
/// blank rather than printing an anonymous document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSnapshot {
    pub invoice_number: String,
    pub status: InvoiceStatus,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub customer: Customer,
    pub items: Vec<InvoiceItem>,
    pub discount: Percentage,
    pub tax_rate: Percentage,
    pub totals: Totals,
    pub notes: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_decimal_string() {
        assert_eq!(Percentage::from_bps(1250).to_decimal_string(), "12.5");
        assert_eq!(Percentage::from_bps(1800).to_decimal_string(), "18");
        assert_eq!(Percentage::from_bps(333).to_decimal_string(), "3.33");
        assert_eq!(Percentage::from_bps(1250).to_string(), "12.5%");
    }

    #[test]
    fn test_percentage_parse_and_display() {
        assert_eq!(Percentage::parse("10").unwrap().bps(), 1000);
        assert_eq!(Percentage::parse("12.5").unwrap().bps(), 1250);
        assert_eq!(Percentage::parse("8.25").unwrap().to_string(), "8.25%");
        assert_eq!(Percentage::from_bps(1250).to_string(), "12.5%");
        assert_eq!(Percentage::from_percent(10).to_string(), "10%");
        assert_eq!(Percentage::from_bps(-500).to_string(), "-5%");
        assert!(Percentage::parse("ten").is_err());
    }

    #[test]
    fn test_percentage_clamp() {
        let over = Percentage::from_percent(150);
        assert_eq!(over.clamp(Percentage::zero(), Percentage::FULL), Percentage::FULL);
        let under = Percentage::from_percent(-3);
        assert_eq!(under.clamp(Percentage::zero(), Percentage::FULL), Percentage::zero());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Consulting".parse::<Category>().unwrap(), Category::Consulting);
        assert_eq!(Category::default(), Category::Product);
        assert!("Hardware".parse::<Category>().is_err());
    }

    #[test]
    fn test_line_item_qualifies() {
        let mut item = LineItem {
            id: ItemId(1),
            name: "Design work".to_string(),
            description: None,
            category: Category::Service,
            quantity: 2,
            rate: Money::from_cents(10000),
        };
        assert!(item.qualifies());
        assert_eq!(item.line_total().cents(), 20000);

        item.name = "   ".to_string();
        assert!(!item.qualifies());

        item.name = "Design work".to_string();
        item.quantity = 0;
        assert!(!item.qualifies());

        item.quantity = 1;
        item.rate = Money::zero();
        assert!(!item.qualifies());
    }

    #[test]
    fn test_contact_lines_skip_blanks() {
        let customer = Customer {
            name: "Asha Traders".to_string(),
            email: Some("accounts@asha.in".to_string()),
            phone: Some("  ".to_string()),
            address: Some("12 MG Road\n\nBengaluru".to_string()),
        };
        assert_eq!(
            customer.contact_lines(),
            vec!["accounts@asha.in", "12 MG Road", "Bengaluru"]
        );
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  "), None);
        assert_eq!(non_blank("x"), Some("x".to_string()));
    }
}
