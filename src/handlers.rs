use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::metrics::MetricsSnapshot;
use crate::models::{LeadResult, PROCESSING_FAILED, VALIDATION_ERROR};
use crate::pipeline::LeadPipeline;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lead intake pipeline (owns the downstream clients and metrics).
    pub pipeline: LeadPipeline,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-intake-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/leads
///
/// Accepts any JSON body and runs it through the lead pipeline. A body that
/// is not JSON at all is reported the same way as a schema mismatch.
///
/// # Returns
///
/// * 200 with the reference id when at least one downstream accepted the lead.
/// * 400 on `VALIDATION_ERROR`, 502 on `PROCESSING_FAILED`.
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<LeadResult>) {
    let raw = match payload {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            tracing::warn!("❌ Lead body rejected: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(LeadResult::validation_failed()),
            );
        }
    };

    let result = state.pipeline.process_lead(&raw).await;
    (status_for(&result), Json(result))
}

/// GET /api/v1/metrics
pub async fn metrics_snapshot(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.pipeline.metrics().snapshot())
}

fn status_for(result: &LeadResult) -> StatusCode {
    match result.error.as_deref() {
        None => StatusCode::OK,
        Some(VALIDATION_ERROR) => StatusCode::BAD_REQUEST,
        Some(PROCESSING_FAILED) => StatusCode::BAD_GATEWAY,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
