//! # Export Pipeline
//!
//! Snapshot in, artifact out. Rendering and encoding are CPU-bound, so the
//! pipeline moves them onto the blocking pool.
//!
//! ```text
//! ┌──────────────┐   spawn_blocking   ┌──────────┐   ┌──────────────┐
//! │InvoiceSnapshot│ ─────────────────►│ render() │──►│ encoder      │──► Artifact
//! └──────────────┘                    └──────────┘   │ .encode()    │
//!                                                    └──────────────┘
//!
//! Artifact ──► ServerDelivery   (HTTP body + headers)
//!          └─► delivery::deliver_download / deliver_print   (user agent)
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error};

use crate::error::{EncodeError, ExportError, ExportResult};
use crate::layout::RenderedDocument;
use crate::pdf::PdfEncoder;
use crate::render::{render, RenderOptions};
use tally_core::InvoiceSnapshot;

/// Turns a laid-out document into bytes.
pub trait DocumentEncoder: Send + Sync {
    fn content_type(&self) -> &'static str;

    /// File extension without the dot.
    fn extension(&self) -> &'static str;

    fn encode(&self, document: &RenderedDocument) -> Result<Vec<u8>, EncodeError>;
}

/// A generated document.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("bytes", &self.bytes.len())
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// How the artifact's file name is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileNaming {
    /// `<invoice number>.pdf`, used for server responses.
    #[default]
    InvoiceNumber,
    /// `invoice-YYYYMMDD.pdf` from the invoice date, used for downloads.
    InvoiceDate,
}

impl FileNaming {
    pub fn filename(&self, snapshot: &InvoiceSnapshot, extension: &str) -> String {
        match self {
            FileNaming::InvoiceNumber => format!("{}.{}", header_safe(&snapshot.invoice_number), extension),
            FileNaming::InvoiceDate => download_filename(snapshot.invoice_date, extension),
        }
    }
}

/// `invoice-20240315.pdf`.
pub fn download_filename(invoice_date: NaiveDate, extension: &str) -> String {
    format!("invoice-{}.{}", invoice_date.format("%Y%m%d"), extension)
}

/// Strips characters that would break a quoted header parameter.
fn header_safe(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\' && *c != '/')
        .collect()
}

// =============================================================================
// Pipeline
// =============================================================================

/// Renders and encodes snapshots.
#[derive(Clone)]
pub struct ExportPipeline {
    encoder: Arc<dyn DocumentEncoder>,
    options: RenderOptions,
}

impl fmt::Debug for ExportPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("content_type", &self.encoder.content_type())
            .field("options", &self.options)
            .finish()
    }
}

impl ExportPipeline {
    pub fn new(encoder: Arc<dyn DocumentEncoder>, options: RenderOptions) -> Self {
        ExportPipeline { encoder, options }
    }

    /// PDF output with default options.
    pub fn pdf() -> Self {
        ExportPipeline::new(Arc::new(PdfEncoder::new()), RenderOptions::default())
    }

    pub fn content_type(&self) -> &'static str {
        self.encoder.content_type()
    }

    /// Produces an artifact or an error, never a partial artifact.
    pub async fn generate(&self, snapshot: InvoiceSnapshot, naming: FileNaming) -> ExportResult<Artifact> {
        let encoder = Arc::clone(&self.encoder);
        let options = self.options.clone();
        let number = snapshot.invoice_number.clone();

        let result = tokio::task::spawn_blocking(move || generate_blocking(encoder.as_ref(), &options, &snapshot, naming))
            .await
            .map_err(|e| ExportError::Generation(format!("worker failed: {}", e)))?;

        match &result {
            Ok(artifact) => debug!(invoice = %number, bytes = artifact.bytes.len(), "Document generated"),
            Err(e) => error!(invoice = %number, error = %e, "Document generation failed"),
        }
        result
    }

    /// Same as [`generate`](Self::generate) on the calling thread.
    pub fn generate_blocking(&self, snapshot: &InvoiceSnapshot, naming: FileNaming) -> ExportResult<Artifact> {
        generate_blocking(self.encoder.as_ref(), &self.options, snapshot, naming)
    }
}

fn generate_blocking(
    encoder: &dyn DocumentEncoder,
    options: &RenderOptions,
    snapshot: &InvoiceSnapshot,
    naming: FileNaming,
) -> ExportResult<Artifact> {
    let document = render(snapshot, options)?;
    let bytes = encoder.encode(&document)?;
    if bytes.is_empty() {
        return Err(ExportError::Generation("encoder produced no output".to_string()));
    }
    Ok(Artifact {
        bytes,
        filename: naming.filename(snapshot, encoder.extension()),
        content_type: encoder.content_type(),
    })
}

// =============================================================================
// Server Delivery
// =============================================================================

/// An artifact shaped as an inline HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDelivery {
    pub body: Vec<u8>,
    pub content_type: &'static str,
    pub content_disposition: String,
}

impl From<Artifact> for ServerDelivery {
    fn from(artifact: Artifact) -> Self {
        ServerDelivery {
            content_disposition: format!("inline; filename=\"{}\"", header_safe(&artifact.filename)),
            content_type: artifact.content_type,
            body: artifact.bytes,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
