//! # Repository Module
//!
//! Database repository implementations for Tally.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.invoices().list(&query)                                    │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │  ├── insert(&self, submission)                                         │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── list(&self, query)                                                │
//! │  ├── update_status(&self, id, status)                                  │
//! │  ├── delete(&self, id)                                                 │
//! │  └── stats(&self)                                                      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`invoice::InvoiceRepository`] - Invoice CRUD, listing and stats
//! - [`draft::DraftRepository`] - Saved drafts (implements [`draft::DraftStore`])

pub mod draft;
pub mod invoice;
