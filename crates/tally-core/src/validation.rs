//! # Validation Module
//!
//! Draft completeness rules and boundary validators for Tally.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Boundary (query strings, path ids, form fields)              │
//! │  ├── validate_uuid, validate_search_query, validate_page_size         │
//! │  └── ItemUpdate::parse, Percentage::parse                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Draft completeness (THIS MODULE)                             │
//! │  ├── validate_draft → ValidationReport (data, not an error)            │
//! │  └── qualifying_items → what actually gets submitted                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE invoice_number                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use chrono::NaiveDate;
//! use tally_core::types::InvoiceDraft;
//! use tally_core::validation::validate_draft;
//!
//! let draft = InvoiceDraft::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
//! let report = validate_draft(&draft);
//! assert!(!report.valid);
//! assert_eq!(
//!     report.errors,
//!     vec!["Customer name is required", "At least one valid item is required"]
//! );
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::ledger::Ledger;
use crate::types::{InvoiceDraft, LineItem};
use crate::{DEFAULT_PAGE_SIZE, MAX_SEARCH_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const CUSTOMER_NAME_REQUIRED: &str = "Customer name is required";
pub const VALID_ITEM_REQUIRED: &str = "At least one valid item is required";

// =============================================================================
// Draft Validation
// =============================================================================

/// Outcome of validating a draft.
///
/// `valid` is true exactly when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub valid: bool,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Checks whether a draft may be submitted.
///
/// ## Rules (evaluated independently, reported in this order)
/// 1. The trimmed customer name is non-empty
/// 2. At least one item has a name, quantity > 0 and rate > 0
pub fn validate_draft(draft: &InvoiceDraft) -> ValidationReport {
    let mut errors = Vec::new();

    if draft.customer.name.trim().is_empty() {
        errors.push(CUSTOMER_NAME_REQUIRED.to_string());
    }

    if qualifying_items(&draft.ledger).is_empty() {
        errors.push(VALID_ITEM_REQUIRED.to_string());
    }

    ValidationReport::from_errors(errors)
}

/// Items that will be submitted, in ledger order.
pub fn qualifying_items(ledger: &Ledger) -> Vec<&LineItem> {
    ledger.qualifying_items().collect()
}

// =============================================================================
// Boundary Validators
// =============================================================================

/// Validates an invoice identifier.
///
/// ## Rules
/// - Hyphenated UUID form: `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`
/// - Hex digits in either case
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("550E8400-E29B-41D4-A716-446655440000").is_ok());
/// assert!(validate_uuid("550e8400e29b41d4a716446655440000").is_err());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<uuid::Uuid> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    };

    // Only the 36-character hyphenated form is accepted.
    if id.len() != 36 {
        return Err(invalid());
    }
    uuid::Uuid::try_parse(id).map_err(|_| invalid())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (no filtering)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query, or `None` when blank.
pub fn validate_search_query(query: &str) -> ValidationResult<Option<String>> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LENGTH {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LENGTH,
        });
    }

    Ok(if query.is_empty() {
        None
    } else {
        Some(query.to_string())
    })
}

/// Validates a requested page size.
///
/// A missing size falls back to the default of 10.
pub fn validate_page_size(limit: Option<u32>, max: u32) -> ValidationResult<u32> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit == 0 || limit > max {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: max as i64,
        });
    }
    Ok(limit)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ItemUpdate;
    use crate::money::Money;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn valid_draft() -> InvoiceDraft {
        let mut draft = InvoiceDraft::new(today());
        draft.customer.name = "Asha Traders".to_string();
        let id = draft.ledger.items()[0].id;
        draft.ledger.update(id, ItemUpdate::Name("Consulting".to_string())).unwrap();
        draft.ledger.update(id, ItemUpdate::Rate(Money::from_cents(50000))).unwrap();
        draft
    }

    #[test]
    fn test_valid_draft() {
        let report = validate_draft(&valid_draft());
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_missing_customer_name_only() {
        let mut draft = valid_draft();
        draft.customer.name = "   ".to_string();
        let report = validate_draft(&draft);
        assert!(!report.valid);
        assert_eq!(report.errors, vec![CUSTOMER_NAME_REQUIRED]);
    }

    #[test]
    fn test_no_qualifying_item() {
        let mut draft = valid_draft();
        let id = draft.ledger.items()[0].id;
        draft.ledger.update(id, ItemUpdate::Quantity(0)).unwrap();
        let report = validate_draft(&draft);
        assert_eq!(report.errors, vec![VALID_ITEM_REQUIRED]);
    }

    #[test]
    fn test_empty_ledger_is_invalid() {
        let mut draft = valid_draft();
        draft.ledger = Ledger::new();
        assert!(!validate_draft(&draft).valid);
    }

    #[test]
    fn test_errors_are_order_stable() {
        let draft = InvoiceDraft::new(today());
        let first = validate_draft(&draft);
        for _ in 0..10 {
            assert_eq!(validate_draft(&draft), first);
        }
        assert_eq!(first.errors, vec![CUSTOMER_NAME_REQUIRED, VALID_ITEM_REQUIRED]);
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("{550e8400-e29b-41d4-a716-446655440000}").is_err());
        assert!(validate_uuid("zzze8400-e29b-41d4-a716-446655440000").is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  INV-2024 ").unwrap().as_deref(), Some("INV-2024"));
        assert_eq!(validate_search_query("   ").unwrap(), None);
        assert!(validate_search_query(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_page_size() {
        assert_eq!(validate_page_size(None, 100).unwrap(), 10);
        assert_eq!(validate_page_size(Some(25), 100).unwrap(), 25);
        assert!(validate_page_size(Some(0), 100).is_err());
        assert!(validate_page_size(Some(101), 100).is_err());
    }
}
