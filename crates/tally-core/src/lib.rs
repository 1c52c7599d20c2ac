//! # tally-core: Pure Business Logic for Tally Invoicing
//!
//! This crate is the **heart** of Tally. It contains the invoice computation
//! and validation rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Authoring UI / HTTP clients                     │   │
//! │  │   Customer form ──► Line items ──► Totals ──► Save / PDF        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 apps/invoice-api (axum)                         │   │
//! │  └──────────┬──────────────────┬───────────────────────────────────┘   │
//! │             │                  │                                        │
//! │  ┌──────────▼──────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐  │   │
//! │  │   │ ledger  │ │ pricing │ │validation│ │ status  │ │ editor │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │             │                  │                                        │
//! │  ┌──────────▼───────┐  ┌───────▼──────────┐                            │
//! │  │    tally-db      │  │  tally-document  │                            │
//! │  │  SQLite storage  │  │  layout + PDF    │                            │
//! │  └──────────────────┘  └──────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (LineItem, InvoiceDraft, Invoice, Snapshot)
//! - [`money`] - Money type with integer arithmetic and INR formatting
//! - [`ledger`] - Ordered line items with stable ids
//! - [`pricing`] - Subtotal, discount, tax and total
//! - [`validation`] - Draft completeness and boundary checks
//! - [`status`] - Invoice lifecycle
//! - [`editor`] - Reducer driving the authoring form
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in paise (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::types::Percentage;
//!
//! let subtotal = Money::from_cents(20000); // ₹200.00
//! let discount = subtotal.percentage_of(Percentage::from_percent(10));
//!
//! assert_eq!(discount.cents(), 2000);
//! assert_eq!((subtotal - discount).format_currency(), "₹180.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod editor;
pub mod error;
pub mod ledger;
pub mod money;
pub mod pricing;
pub mod status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::Totals;
pub use status::InvoiceStatus;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items on one invoice.
///
/// ## Business Reason
/// Keeps the printed document to a handful of pages and bounds the size of
/// a single insert.
pub const MAX_LEDGER_ITEMS: usize = 200;

/// Days between invoice date and due date when nothing else is configured.
pub const DEFAULT_PAYMENT_TERMS_DAYS: u32 = 30;

/// Dashboard page size when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Longest accepted free-text search.
pub const MAX_SEARCH_LENGTH: usize = 100;
