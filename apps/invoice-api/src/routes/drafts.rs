//! Saved drafts.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::{error, info};

use crate::dto::{ApiResponse, CreatedDraft, DraftView, InvoiceForm};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// `POST /api/drafts` - stores the form as-is; incomplete drafts are allowed.
pub async fn save(
    State(state): State<AppState>,
    Json(form): Json<InvoiceForm>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CreatedDraft>>)> {
    let draft_state = form.into_state(state.today())?;

    let id = state.drafts.save(&draft_state.draft).await.map_err(|e| {
        error!(error = %e, "Failed to save draft");
        ApiError::internal("Failed to save draft")
    })?;

    info!(id = %id, valid = draft_state.validation.valid, "Draft saved");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(CreatedDraft { id }))))
}

/// `GET /api/drafts` - newest first.
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<DraftView>>>> {
    let drafts = state.drafts.list().await.map_err(|e| {
        error!(error = %e, "Failed to list drafts");
        ApiError::internal("Failed to fetch drafts")
    })?;
    Ok(Json(ApiResponse::ok(drafts.into_iter().map(DraftView::from).collect())))
}
