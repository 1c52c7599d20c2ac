//! # Status Lifecycle
//!
//! Lifecycle state of a persisted invoice.
//!
//! ## Conventional Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   draft ──────► sent ──────► paid                                       │
//! │     │            │            ▲                                         │
//! │     │            ▼            │                                         │
//! │     │         overdue ────────┘                                         │
//! │     │            │                                                      │
//! │     └────────────┴──────────► cancelled                                 │
//! │                                                                         │
//! │   paid and cancelled are terminal in the conventional flow.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Permissive Overwrite
//! Any recognized status may replace any other; the diagram above is advice,
//! not enforcement. [`request_transition`] reports whether a move is
//! conventional so callers can log the odd ones. Only an unrecognized status
//! string is rejected.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 5] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
        InvoiceStatus::Cancelled,
    ];

    /// Wire name, as stored and as sent to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// Label printed on the document.
    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }

    /// Paid and cancelled invoices leave the conventional flow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }

    /// Counted as "pending" on the dashboard.
    pub fn is_pending(&self) -> bool {
        matches!(self, InvoiceStatus::Draft | InvoiceStatus::Sent)
    }

    /// Whether `self → target` follows the conventional flow.
    pub fn is_conventional(&self, target: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        match (*self, target) {
            (Draft, Sent) | (Sent, Paid) | (Sent, Overdue) | (Overdue, Paid) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse: exact lowercase wire names only.
impl FromStr for InvoiceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::UnknownStatus(s.to_string()))
    }
}

// =============================================================================
// Transitions
// =============================================================================

/// An accepted status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: InvoiceStatus,
    pub to: InvoiceStatus,
    /// False when the move skips or reverses the conventional flow.
    pub conventional: bool,
}

impl StatusChange {
    /// Same status requested again.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Validates a requested status against the current one.
///
/// ## Example
/// ```rust
/// use tally_core::status::{request_transition, InvoiceStatus};
///
/// let change = request_transition(InvoiceStatus::Draft, "paid").unwrap();
/// assert_eq!(change.to, InvoiceStatus::Paid);
/// assert!(!change.conventional); // accepted anyway
///
/// assert!(request_transition(InvoiceStatus::Draft, "archived").is_err());
/// ```
pub fn request_transition(current: InvoiceStatus, raw_target: &str) -> Result<StatusChange, CoreError> {
    let to: InvoiceStatus = raw_target.parse()?;
    Ok(StatusChange {
        from: current,
        to,
        conventional: current == to || current.is_conventional(to),
    })
}

/// Whether an invoice with this due date is past due on `today`.
///
/// Callers decide whether to mark it overdue; the status never changes by
/// itself.
pub fn is_past_due(status: InvoiceStatus, due_date: NaiveDate, today: NaiveDate) -> bool {
    matches!(status, InvoiceStatus::Sent) && today > due_date
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_draft() {
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Draft);
    }

    #[test]
    fn test_parse_is_strict() {
        assert_eq!("sent".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Sent);
        assert!("Sent".parse::<InvoiceStatus>().is_err());
        assert!(" paid".parse::<InvoiceStatus>().is_err());
        assert!("".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn test_serde_wire_names() {
        let json = serde_json::to_string(&InvoiceStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        let parsed: InvoiceStatus = serde_json::from_str("\"overdue\"").unwrap();
        assert_eq!(parsed, InvoiceStatus::Overdue);
    }

    #[test]
    fn test_conventional_moves() {
        use InvoiceStatus::*;
        assert!(Draft.is_conventional(Sent));
        assert!(Sent.is_conventional(Paid));
        assert!(Sent.is_conventional(Overdue));
        assert!(Overdue.is_conventional(Paid));
        assert!(Draft.is_conventional(Cancelled));
        assert!(Overdue.is_conventional(Cancelled));

        assert!(!Paid.is_conventional(Draft));
        assert!(!Cancelled.is_conventional(Sent));
        assert!(!Paid.is_conventional(Cancelled));
        assert!(!Draft.is_conventional(Paid));
    }

    #[test]
    fn test_unconventional_transition_is_accepted() {
        let change = request_transition(InvoiceStatus::Paid, "draft").unwrap();
        assert_eq!(change.from, InvoiceStatus::Paid);
        assert_eq!(change.to, InvoiceStatus::Draft);
        assert!(!change.conventional);
    }

    #[test]
    fn test_same_status_is_noop() {
        let change = request_transition(InvoiceStatus::Sent, "sent").unwrap();
        assert!(change.is_noop());
        assert!(change.conventional);
    }

    #[test]
    fn test_unknown_status_rejected() {
        let err = request_transition(InvoiceStatus::Sent, "archived").unwrap_err();
        assert!(matches!(err, CoreError::UnknownStatus(s) if s == "archived"));
    }

    #[test]
    fn test_is_past_due() {
        let due = NaiveDate::from_ymd_opt(2024, 4, 14).unwrap();
        let after = NaiveDate::from_ymd_opt(2024, 4, 15).unwrap();
        assert!(is_past_due(InvoiceStatus::Sent, due, after));
        assert!(!is_past_due(InvoiceStatus::Sent, due, due));
        assert!(!is_past_due(InvoiceStatus::Paid, due, after));
        assert!(!is_past_due(InvoiceStatus::Draft, due, after));
    }
}
