//! OPD slip endpoints.
//!
//! The slip is returned even when the record store rejects it; the
//! outcome of the write travels alongside in `persistence`.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};
use crate::models::{OpdSlip, OpdSlipRequest, PatientSnapshot};
use crate::store::PersistenceStatus;
use crate::validation::validate_opd_request;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FromPatientBody {
    #[serde(default)]
    pub doctor_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OpdSlipResponse {
    #[serde(flatten)]
    pub slip: OpdSlip,
    pub persistence: PersistenceStatus,
}

/// `POST /api/patients/:id/opd-slips`: slip for a registered patient.
pub async fn from_patient(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    body: Option<Json<FromPatientBody>>,
) -> Result<Json<OpdSlipResponse>, ApiError> {
    let patient = ctx
        .core
        .registry
        .get_patient_by_id(&id)?
        .ok_or_else(|| ApiError::NotFound(format!("Patient not found: {id}")))?;
    let doctor_name = body.and_then(|Json(b)| b.doctor_name);

    issue(&ctx, &patient.snapshot(), doctor_name.as_deref())
}

/// `POST /api/opd-slips`: walk-in slip from a posted snapshot.
pub async fn from_snapshot(
    State(ctx): State<ApiContext>,
    ApiJson(request): ApiJson<OpdSlipRequest>,
) -> Result<Json<OpdSlipResponse>, ApiError> {
    let snapshot = validate_opd_request(&request)?;
    issue(&ctx, &snapshot, request.doctor_name.as_deref())
}

fn issue(
    ctx: &ApiContext,
    snapshot: &PatientSnapshot,
    doctor_name: Option<&str>,
) -> Result<Json<OpdSlipResponse>, ApiError> {
    let slip = ctx.core.opd.generate(snapshot, doctor_name)?;
    let persistence = PersistenceStatus::from_result(ctx.core.records.save_opd_slip(&slip));
    if let Some(error) = &persistence.error {
        tracing::warn!(slip_id = %slip.id, error = %error, "OPD slip not persisted");
    }
    Ok(Json(OpdSlipResponse { slip, persistence }))
}
