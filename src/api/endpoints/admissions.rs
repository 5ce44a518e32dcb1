use axum::extract::State;
use axum::Json;

use crate::admission::{admit_emergency, AdmissionOutcome};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};
use crate::models::EmergencyAdmission;

/// `POST /api/admissions`: emergency admission; consent is mandatory.
pub async fn admit(
    State(ctx): State<ApiContext>,
    ApiJson(admission): ApiJson<EmergencyAdmission>,
) -> Result<Json<AdmissionOutcome>, ApiError> {
    let outcome = admit_emergency(&admission, ctx.core.registry.as_ref())?;
    Ok(Json(outcome))
}
