use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
    /// `None` when the generation service did not answer.
    pub model_available: Option<bool>,
    pub record_store: &'static str,
    pub patient_count: usize,
    pub uptime_secs: u64,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let patient_count = ctx.core.registry.list_patients()?.len();
    let model_available = ctx.core.drafts.model_available().await;

    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        model: ctx.core.drafts.model().to_string(),
        model_available,
        record_store: ctx.core.records.backend(),
        patient_count,
        uptime_secs: ctx.core.uptime_secs(),
    }))
}
