use std::sync::Arc;

use thiserror::Error;

use super::parser::{parse_note_response, parse_prescription_response};
use super::prompt::{
    build_note_prompt, build_prescription_prompt, build_report_prompt, build_symptom_prompt,
    system_prompt,
};
use super::sanitize::{
    default_disclaimer, ensure_disclaimer, sanitize_llm_output, split_trailing_disclaimer,
};
use crate::models::{
    ClinicalRequest, DraftKind, NoteDraft, NoteDraftRequest, PrescriptionDraft,
    PrescriptionDraftRequest, PrescriptionResponse, PrescriptionSections, ReportSummary,
    ReportSummaryRequest, StructuredPrescription, SymptomAnalysis, SymptomAnalysisRequest,
};
use crate::pipeline::generation::{GenerationClient, GenerationError};
use crate::pipeline::sections::extract_prescription_sections;
use crate::validation::{validate_clinical_request, validate_note_request, ValidationErrors};

#[derive(Error, Debug)]
pub enum DraftError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Clinical draft generation:
/// validate → prompt → generate → sanitize → parse → disclaimer.
///
/// Generation runs on the blocking pool. Dropping the returned future
/// abandons the result; the blocking call itself runs to completion.
pub struct DraftService {
    client: Arc<dyn GenerationClient>,
    model: String,
}

impl DraftService {
    pub fn new(client: Arc<dyn GenerationClient>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether the configured model is installed; `None` when the
    /// generation service cannot be asked.
    pub async fn model_available(&self) -> Option<bool> {
        let client = Arc::clone(&self.client);
        let model = self.model.clone();
        match tokio::task::spawn_blocking(move || client.is_model_available(&model)).await {
            Ok(Ok(available)) => Some(available),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Model availability check failed");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Model availability task failed");
                None
            }
        }
    }

    pub async fn analyze_symptoms(
        &self,
        request: &SymptomAnalysisRequest,
    ) -> Result<SymptomAnalysis, DraftError> {
        validate_clinical_request(request)?;
        let prompt = build_symptom_prompt(&request.symptoms, request.patient_name.as_deref());
        let text = self.generate(request.kind(), prompt).await?;

        let (analysis, disclaimer) = split_trailing_disclaimer(&text);
        let analysis = non_empty_body(analysis, &text);
        Ok(SymptomAnalysis {
            analysis,
            disclaimer: ensure_disclaimer(disclaimer.as_deref(), DraftKind::SymptomAnalysis),
        })
    }

    pub async fn summarize_report(
        &self,
        request: &ReportSummaryRequest,
    ) -> Result<ReportSummary, DraftError> {
        validate_clinical_request(request)?;
        let prompt = build_report_prompt(&request.report_text);
        let text = self.generate(request.kind(), prompt).await?;

        let (summary, disclaimer) = split_trailing_disclaimer(&text);
        let summary = non_empty_body(summary, &text);
        Ok(ReportSummary {
            summary,
            disclaimer: ensure_disclaimer(disclaimer.as_deref(), DraftKind::ReportSummary),
        })
    }

    pub async fn generate_note(&self, request: &NoteDraftRequest) -> Result<NoteDraft, DraftError> {
        validate_note_request(request)?;
        let prompt = build_note_prompt(&request.keyword_list());
        let text = self.generate(request.kind(), prompt).await?;

        if let Some(parsed) = parse_note_response(&text) {
            return Ok(NoteDraft {
                note: parsed.sections.render(),
                sections: Some(parsed.sections),
                disclaimer: ensure_disclaimer(parsed.disclaimer.as_deref(), DraftKind::Note),
            });
        }

        tracing::info!("Note draft returned as free text");
        let (note, disclaimer) = split_trailing_disclaimer(&text);
        Ok(NoteDraft {
            note: non_empty_body(note, &text),
            sections: None,
            disclaimer: ensure_disclaimer(disclaimer.as_deref(), DraftKind::Note),
        })
    }

    pub async fn generate_prescription(
        &self,
        request: &PrescriptionDraftRequest,
    ) -> Result<PrescriptionResponse, DraftError> {
        validate_clinical_request(request)?;
        let prompt = build_prescription_prompt(&request.diagnosis);
        let text = self.generate(request.kind(), prompt).await?;
        Ok(prescription_from_text(&text))
    }

    /// Run the model for `kind` and return sanitized, non-empty text.
    async fn generate(&self, kind: DraftKind, prompt: String) -> Result<String, GenerationError> {
        let client = Arc::clone(&self.client);
        let model = self.model.clone();
        let system = system_prompt(kind);

        let started = std::time::Instant::now();
        let raw = tokio::task::spawn_blocking(move || client.generate(&model, &prompt, system))
            .await
            .map_err(|e| GenerationError::Task(e.to_string()))?
            .inspect_err(|e| tracing::warn!(kind = %kind, error = %e, "Generation failed"))?;

        let text = sanitize_llm_output(&raw);
        tracing::info!(
            kind = %kind,
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            chars = text.len(),
            "Draft generated"
        );

        if text.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(text)
    }
}

/// Build the prescription response from sanitized model text.
///
/// Structured JSON wins; otherwise the text is kept verbatim as a legacy
/// draft and partitioned by the section extractor for display.
pub fn prescription_from_text(text: &str) -> PrescriptionResponse {
    if let Some(parsed) = parse_prescription_response(text) {
        let structured = StructuredPrescription {
            disclaimer: ensure_disclaimer(parsed.disclaimer.as_deref(), DraftKind::Prescription),
            medications: parsed.medications,
            advice: parsed.advice,
        };
        let sections = PrescriptionSections {
            medications: structured
                .medications
                .iter()
                .map(|m| m.display_line())
                .collect(),
            advice: structured.advice.clone(),
            disclaimer: structured.disclaimer.clone(),
        };
        return PrescriptionResponse {
            draft: PrescriptionDraft::Structured(structured),
            sections,
        };
    }

    tracing::info!("Prescription draft returned as free text");
    let mut sections = extract_prescription_sections(text);
    sections.disclaimer =
        ensure_disclaimer(Some(sections.disclaimer.as_str()), DraftKind::Prescription);
    // Headerless text lands in the disclaimer slot; keep it but add the notice.
    if sections.medications.is_empty()
        && sections.advice.is_empty()
        && !sections.disclaimer.to_lowercase().contains("disclaimer")
    {
        sections.disclaimer = format!(
            "{}\n\n{}",
            sections.disclaimer,
            default_disclaimer(DraftKind::Prescription)
        );
    }
    PrescriptionResponse {
        draft: PrescriptionDraft::Legacy {
            text: text.to_string(),
        },
        sections,
    }
}

/// A response that is only a disclaimer still yields a body.
fn non_empty_body(body: String, full_text: &str) -> String {
    if body.is_empty() {
        full_text.to_string()
    } else {
        body
    }
}
