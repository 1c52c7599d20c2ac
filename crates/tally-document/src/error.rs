//! # Document Errors
//!
//! ```text
//! render()          ──► RenderError      snapshot unusable
//! encode()          ──► EncodeError      backend failed
//! ExportPipeline    ──► ExportError      any of the above, no artifact
//! deliver_*()       ──► DeliveryError    artifact exists, handoff failed
//! ```
//!
//! Generation failures and delivery failures are separate types so callers
//! can tell "no document" apart from "document not shown".

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Cannot render invoice: {0} is missing")]
    MissingField(&'static str),
}

/// Failure inside a [`crate::DocumentEncoder`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Encoding failed: {0}")]
pub struct EncodeError(pub String);

impl EncodeError {
    pub fn new(reason: impl std::fmt::Display) -> Self {
        EncodeError(reason.to_string())
    }
}

/// Document generation failed; no artifact was produced.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Document generation failed: {0}")]
    Generation(String),
}

impl From<EncodeError> for ExportError {
    fn from(err: EncodeError) -> Self {
        ExportError::Generation(err.0)
    }
}

/// Handing a generated artifact to the user failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The environment refused to open a viewer (popup blocked).
    #[error("Viewer could not be opened")]
    Blocked,

    #[error("Viewer did not finish loading within {0:?}")]
    ViewerTimeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("User agent error: {0}")]
    Agent(String),
}

pub type ExportResult<T> = Result<T, ExportError>;
pub type DeliveryResult<T> = Result<T, DeliveryError>;
