//! PDF retrieval.
//!
//! ```text
//! GET /api/invoices/:id/pdf
//!   id malformed      → 400 "Invalid invoice ID format"   (no lookup)
//!   no such invoice   → 404 "Invoice not found"
//!   lookup failed     → 500 "Failed to fetch invoice"
//!   generation failed → 500 "Failed to generate PDF"
//!   ok                → 200 application/pdf, inline; filename="<number>.pdf"
//! ```

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info};

use super::invoice_id;
use crate::dto::InvoiceForm;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use tally_document::{FileNaming, ServerDelivery};

/// `GET /api/invoices/:id/pdf`
pub async fn invoice_pdf(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = invoice_id(&id)?;

    let invoice = match state.db.invoices().get_by_id(id).await {
        Ok(Some(invoice)) => invoice,
        Ok(None) => return Err(ApiError::not_found("Invoice not found")),
        Err(e) => {
            error!(id = %id, error = %e, "Invoice lookup failed");
            return Err(ApiError::internal("Failed to fetch invoice"));
        }
    };

    let artifact = state
        .export
        .generate(invoice.snapshot(), FileNaming::InvoiceNumber)
        .await
        .map_err(|e| {
            error!(id = %id, error = %e, "Error generating invoice PDF");
            ApiError::internal("Failed to generate PDF")
        })?;

    info!(id = %id, filename = %artifact.filename, "Invoice PDF served");
    Ok(inline(ServerDelivery::from(artifact)))
}

/// `POST /api/drafts/preview` - renders an unsaved, valid draft as a
/// download named `invoice-YYYYMMDD.pdf`.
pub async fn draft_preview(State(state): State<AppState>, Json(form): Json<InvoiceForm>) -> ApiResult<Response> {
    let submission = form.into_state(state.today())?.submit()?;

    let artifact = state
        .export
        .generate(submission.preview_snapshot(), FileNaming::InvoiceDate)
        .await
        .map_err(|e| {
            error!(error = %e, "Error generating draft preview");
            ApiError::internal("Failed to generate PDF")
        })?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

fn inline(delivery: ServerDelivery) -> Response {
    (
        [
            (header::CONTENT_TYPE, delivery.content_type.to_string()),
            (header::CONTENT_DISPOSITION, delivery.content_disposition),
        ],
        delivery.body,
    )
        .into_response()
}
