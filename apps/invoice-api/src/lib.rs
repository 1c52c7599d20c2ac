//! # Tally Invoice API
//!
//! JSON over HTTP for the authoring form and the admin dashboard.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET    /health                    liveness + database ping            │
//! │                                                                         │
//! │  GET    /api/invoices              list (page, limit, search, status,  │
//! │                                          sortBy, sortOrder)             │
//! │  POST   /api/invoices              submit a draft                      │
//! │  GET    /api/invoices/stats        dashboard counters                  │
//! │  GET    /api/invoices/:id          one invoice                         │
//! │  PUT    /api/invoices/:id          { "status": "..." }                 │
//! │  DELETE /api/invoices/:id          remove                              │
//! │  GET    /api/invoices/:id/pdf      inline PDF                          │
//! │                                                                         │
//! │  GET    /api/drafts                saved drafts, newest first          │
//! │  POST   /api/drafts                save a draft                        │
//! │  POST   /api/drafts/preview        PDF of an unsaved draft (download)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Amounts
//! Money fields are integer paise (`18000` is ₹180.00) and percentages are
//! integer basis points (`1250` is 12.5%). Every invoice also carries a
//! `decimals` object with the same values as decimal strings in rupees and
//! percent. Request bodies accept rupees and percent, as JSON numbers or
//! strings.
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_HOST` / `HTTP_PORT` - listener (default `127.0.0.1:3000`)
//! - `DATABASE_PATH` - SQLite file (default `tally.db`)
//! - `PAYMENT_TERMS_DAYS` - due date offset (default 30)
//! - `MAX_PAGE_SIZE` - cap on `limit` (default 100)
//! - `RUST_LOG` - log filter (default `info`)

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use chrono::{NaiveDate, Utc};
use tower::ServiceBuilder;
use tracing::info;

use crate::config::ApiConfig;
use tally_db::{Database, DraftStore};
use tally_document::ExportPipeline;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub drafts: Arc<dyn DraftStore>,
    pub export: ExportPipeline,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Production wiring: SQLite drafts, PDF export.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            drafts: Arc::new(db.drafts()),
            db,
            export: ExportPipeline::pdf(),
            config: Arc::new(config),
        }
    }

    pub fn with_drafts(mut self, drafts: Arc<dyn DraftStore>) -> Self {
        self.drafts = drafts;
        self
    }

    pub fn with_export(mut self, export: ExportPipeline) -> Self {
        self.export = export;
        self
    }

    /// Date used for new drafts and past-due checks.
    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    use routes::{drafts, health, invoices, pdf};

    Router::new()
        .route("/health", get(health::health))
        .route("/api/invoices", get(invoices::list).post(invoices::create))
        .route("/api/invoices/stats", get(invoices::stats))
        .route(
            "/api/invoices/:id",
            get(invoices::get_one).put(invoices::update_status).delete(invoices::delete),
        )
        .route("/api/invoices/:id/pdf", get(pdf::invoice_pdf))
        .route("/api/drafts", get(drafts::list).post(drafts::save))
        .route("/api/drafts/preview", post(pdf::draft_preview))
        .layer(ServiceBuilder::new().layer(middleware::from_fn(log_request)))
        .with_state(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request handled"
    );
    response
}
