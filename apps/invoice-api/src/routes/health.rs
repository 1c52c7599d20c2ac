//! Liveness check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::dto::{ApiResponse, HealthView};
use crate::AppState;

/// 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthView>>) {
    let database = state.db.health_check().await;
    let (code, status) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        code,
        Json(ApiResponse::ok(HealthView {
            status,
            database,
            version: env!("CARGO_PKG_VERSION"),
        })),
    )
}
