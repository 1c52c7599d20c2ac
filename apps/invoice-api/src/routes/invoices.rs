//! Invoice CRUD and dashboard stats.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{info, warn};

use super::invoice_id;
use crate::dto::{
    ApiResponse, DeletedInvoice, InvoiceForm, InvoiceListResponse, InvoiceView, ListParams, StatusUpdateRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use tally_core::status::request_transition;
use tally_db::InvoiceStats;

/// `GET /api/invoices`
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ApiResponse<InvoiceListResponse>>> {
    let query = params.into_query(state.config.max_page_size)?;
    let page = state
        .db
        .invoices()
        .list(&query)
        .await
        .map_err(|e| ApiError::storage(e, "Failed to fetch invoices"))?;

    let today = state.today();
    Ok(Json(ApiResponse::ok(InvoiceListResponse {
        invoices: page
            .invoices
            .into_iter()
            .map(|invoice| InvoiceView::new(invoice, today))
            .collect(),
        pagination: page.pagination,
    })))
}

/// `GET /api/invoices/stats`
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<InvoiceStats>>> {
    let stats = state
        .db
        .invoices()
        .stats()
        .await
        .map_err(|e| ApiError::storage(e, "Failed to fetch stats"))?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// `POST /api/invoices` - submits the form.
///
/// Responds 400 with the ordered validation messages when the draft is
/// incomplete; nothing is stored in that case.
pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<InvoiceForm>,
) -> ApiResult<(StatusCode, Json<ApiResponse<InvoiceView>>)> {
    let draft_state = form.into_state(state.today())?;
    let submission = draft_state.submit()?;

    let invoice = state
        .db
        .invoices()
        .insert(&submission)
        .await
        .map_err(|e| ApiError::storage(e, "Failed to create invoice"))?;

    info!(
        id = %invoice.id,
        invoice_number = %invoice.invoice_number,
        total = %invoice.total,
        "Invoice created"
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(InvoiceView::new(invoice, state.today()))),
    ))
}

/// `GET /api/invoices/:id`
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<InvoiceView>>> {
    let id = invoice_id(&id)?;
    let invoice = state
        .db
        .invoices()
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::storage(e, "Failed to fetch invoice"))?
        .ok_or_else(|| ApiError::not_found("Invoice not found"))?;
    Ok(Json(ApiResponse::ok(InvoiceView::new(invoice, state.today()))))
}

/// `PUT /api/invoices/:id` - overwrites the status.
///
/// Unknown values are rejected before anything is written. Moves outside
/// the conventional flow are accepted and logged.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdateRequest>,
) -> ApiResult<Json<ApiResponse<InvoiceView>>> {
    let id = invoice_id(&id)?;
    let repo = state.db.invoices();

    let current = repo
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::storage(e, "Failed to fetch invoice"))?
        .ok_or_else(|| ApiError::not_found("Invoice not found"))?;

    let change = request_transition(current.status, &body.status)?;
    if !change.conventional {
        warn!(
            id = %id,
            from = %change.from,
            to = %change.to,
            "Unconventional status change"
        );
    }

    let updated = repo
        .update_status(id, change.to)
        .await
        .map_err(|e| ApiError::storage(e, "Failed to update invoice status"))?;

    info!(id = %id, status = %updated.status, "Invoice status updated");
    Ok(Json(ApiResponse::ok(InvoiceView::new(updated, state.today()))))
}

/// `DELETE /api/invoices/:id`
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<DeletedInvoice>>> {
    let id = invoice_id(&id)?;
    state
        .db
        .invoices()
        .delete(id)
        .await
        .map_err(|e| ApiError::storage(e, "Failed to delete invoice"))?;

    info!(id = %id, "Invoice deleted");
    Ok(Json(ApiResponse::ok(DeletedInvoice { id })))
}
