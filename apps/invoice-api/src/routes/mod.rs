//! HTTP handlers, one module per resource.

pub mod drafts;
pub mod health;
pub mod invoices;
pub mod pdf;

use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use tally_core::validation::validate_uuid;

/// Parses an invoice id from the path.
pub(crate) fn invoice_id(raw: &str) -> ApiResult<Uuid> {
    validate_uuid(raw).map_err(|_| ApiError::bad_request("Invalid invoice ID format"))
}
