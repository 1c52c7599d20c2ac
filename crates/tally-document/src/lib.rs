//! # tally-document: Invoice Documents
//!
//! Layout, encoding and delivery of invoice documents.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌─────────────┐     ┌──────────┐
//! │ InvoiceSnapshot │ ──► │   render()   │ ──► │ PdfEncoder  │ ──► │ Artifact │
//! │  (tally-core)   │     │ layout pages │     │  printpdf   │     │  bytes   │
//! └─────────────────┘     └──────────────┘     └─────────────┘     └────┬─────┘
//!                                                                       │
//!                        ┌──────────────────────────┬───────────────────┘
//!                        ▼                          ▼
//!               ServerDelivery              deliver_download / deliver_print
//!            (inline HTTP response)            (UserAgent, SpoolAgent)
//! ```
//!
//! ## Modules
//!
//! - [`layout`] - Page geometry and the rendered block model
//! - [`render`] - Snapshot to paginated document
//! - [`pdf`] - PDF encoder
//! - [`export`] - Export pipeline, artifacts, HTTP delivery shape
//! - [`delivery`] - Download and print through a user agent
//! - [`error`] - Render, export and delivery errors

pub mod delivery;
pub mod error;
pub mod export;
pub mod layout;
pub mod pdf;
pub mod render;

pub use delivery::{deliver_download, deliver_print, PrintSettings, SpoolAgent, TransientRef, UserAgent, Viewer};
pub use error::{DeliveryError, EncodeError, ExportError, RenderError};
pub use export::{Artifact, DocumentEncoder, ExportPipeline, FileNaming, ServerDelivery};
pub use layout::{Block, PageLayout, RenderedDocument};
pub use pdf::PdfEncoder;
pub use render::{render, RenderOptions};
