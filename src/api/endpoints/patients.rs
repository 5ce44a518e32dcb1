//! Patient registry endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};
use crate::models::{MedicalNote, Patient, PatientSummary, RegistrationRequest};
use crate::registry::register_patient;
use crate::validation::validate_registration;

#[derive(Debug, Deserialize)]
pub struct NoteBody {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub patient_id: String,
    pub recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<MedicalNote>,
}

/// `GET /api/patients`: registration order.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<PatientSummary>>, ApiError> {
    let patients = ctx.core.registry.list_patients()?;
    Ok(Json(patients.iter().map(PatientSummary::from).collect()))
}

/// `POST /api/patients`
pub async fn register(
    State(ctx): State<ApiContext>,
    ApiJson(request): ApiJson<RegistrationRequest>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let new_patient = validate_registration(&request)?;
    let patient = register_patient(ctx.core.registry.as_ref(), new_patient)?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    ctx.core
        .registry
        .get_patient_by_id(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Patient not found: {id}")))
}

/// `POST /api/patients/:id/notes`
pub async fn add_note(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<NoteBody>,
) -> Result<Json<NoteResponse>, ApiError> {
    let note = ctx.core.registry.append_note(&id, &body.content)?;
    Ok(Json(NoteResponse {
        patient_id: id,
        recorded: note.is_some(),
        note,
    }))
}
