use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};
use crate::identification::{log_identification_event, IdentificationOutcome};
use crate::models::IdentificationEvent;

/// `POST /api/identifications`
pub async fn log_event(
    State(ctx): State<ApiContext>,
    ApiJson(event): ApiJson<IdentificationEvent>,
) -> Result<Json<IdentificationOutcome>, ApiError> {
    let outcome = log_identification_event(&event, ctx.core.records.as_ref())?;
    Ok(Json(outcome))
}
