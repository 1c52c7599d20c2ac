//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Ledger, status and submission failures         │
//! │  └── ValidationError  - Malformed input at the boundary                │
//! │                                                                         │
//! │  tally-db errors        └── DbError        - Storage failures          │
//! │  tally-document errors  ├── RenderError    - Unrenderable snapshot     │
//! │                         ├── ExportError    - Generation failed         │
//! │                         └── DeliveryError  - Viewer blocked, I/O       │
//! │  invoice-api errors     └── ApiError       - What HTTP clients see     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Draft Validation Is Data
//! An incomplete draft is a normal state of the authoring form, so
//! [`crate::validation::validate_draft`] returns a report instead of an
//! error. Only an attempt to *submit* an invalid draft becomes
//! [`CoreError::InvalidDraft`].

use thiserror::Error;

use crate::types::ItemId;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No line item with this id exists in the ledger.
    #[error("Line item not found: {0}")]
    ItemNotFound(ItemId),

    /// The authoring form always keeps one row.
    #[error("Cannot remove the last line item")]
    LastItem,

    /// Ledger has reached its size limit.
    #[error("An invoice cannot have more than {max} items")]
    LedgerFull { max: usize },

    /// Status string is not one of the five lifecycle values.
    ///
    /// ## When This Occurs
    /// ```text
    /// PUT /api/invoices/:id { "status": "archived" }
    ///      │
    ///      ▼
    /// request_transition(current, "archived")
    ///      │
    ///      ▼
    /// UnknownStatus("archived")  → 400, stored status untouched
    /// ```
    #[error("Invalid status: {0}")]
    UnknownStatus(String),

    /// Submission refused; carries the ordered validation messages.
    #[error("Invoice is incomplete: {}", .0.join(", "))]
    InvalidDraft(Vec<String>),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised when a raw value from a form or query string cannot be turned into
/// a domain value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, invalid number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(CoreError::LastItem.to_string(), "Cannot remove the last line item");
        assert_eq!(
            CoreError::UnknownStatus("archived".to_string()).to_string(),
            "Invalid status: archived"
        );
        assert_eq!(
            CoreError::InvalidDraft(vec![
                "Customer name is required".to_string(),
                "At least one valid item is required".to_string(),
            ])
            .to_string(),
            "Invoice is incomplete: Customer name is required, At least one valid item is required"
        );
    }

    #[test]
    fn test_validation_converts_into_core_error() {
        let err: CoreError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
