//! Clinical draft endpoints. Every response carries a disclaimer.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};
use crate::models::{
    NoteDraft, NoteDraftRequest, PrescriptionDraftRequest, PrescriptionResponse,
    PrescriptionSections, ReportSummary, ReportSummaryRequest, SymptomAnalysis,
    SymptomAnalysisRequest,
};
use crate::pipeline::sections::extract_prescription_sections;

#[derive(Debug, Deserialize)]
pub struct SectionsBody {
    pub text: String,
}

/// `POST /api/drafts/symptoms`
pub async fn symptoms(
    State(ctx): State<ApiContext>,
    ApiJson(request): ApiJson<SymptomAnalysisRequest>,
) -> Result<Json<SymptomAnalysis>, ApiError> {
    Ok(Json(ctx.core.drafts.analyze_symptoms(&request).await?))
}

/// `POST /api/drafts/report-summary`
pub async fn report_summary(
    State(ctx): State<ApiContext>,
    ApiJson(request): ApiJson<ReportSummaryRequest>,
) -> Result<Json<ReportSummary>, ApiError> {
    Ok(Json(ctx.core.drafts.summarize_report(&request).await?))
}

/// `POST /api/drafts/note`
pub async fn note(
    State(ctx): State<ApiContext>,
    ApiJson(request): ApiJson<NoteDraftRequest>,
) -> Result<Json<NoteDraft>, ApiError> {
    Ok(Json(ctx.core.drafts.generate_note(&request).await?))
}

/// `POST /api/drafts/prescription`
pub async fn prescription(
    State(ctx): State<ApiContext>,
    ApiJson(request): ApiJson<PrescriptionDraftRequest>,
) -> Result<Json<PrescriptionResponse>, ApiError> {
    Ok(Json(ctx.core.drafts.generate_prescription(&request).await?))
}

/// `POST /api/drafts/prescription/sections`: partition an existing draft.
pub async fn prescription_sections(
    ApiJson(body): ApiJson<SectionsBody>,
) -> Result<Json<PrescriptionSections>, ApiError> {
    if body.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Prescription text is required".into()));
    }
    Ok(Json(extract_prescription_sections(&body.text)))
}
