//! Emergency admission with mandatory consent.

use serde::Serialize;
use thiserror::Error;

use crate::models::{EmergencyAdmission, MedicalNote};
use crate::registry::{PatientRepository, RegistryError};
use crate::validation::{validate_admission, ValidationErrors};

#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionOutcome {
    pub patient_id: String,
    /// The history entry, absent when the patient is not in the registry.
    pub note: Option<MedicalNote>,
}

/// Validate the admission form and record it in the patient's history.
pub fn admit_emergency(
    admission: &EmergencyAdmission,
    registry: &dyn PatientRepository,
) -> Result<AdmissionOutcome, AdmissionError> {
    let admitted_at = validate_admission(admission)?;
    let patient_id = admission.patient_id.trim();

    let mut content = format!(
        "Emergency admission at {}. Consent given.",
        admitted_at.to_rfc3339()
    );
    if let Some(notes) = admission
        .admission_notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        content.push_str(" Notes: ");
        content.push_str(notes);
    }

    let note = registry.append_note(patient_id, &content)?;
    tracing::info!(
        patient_id,
        recorded = note.is_some(),
        "Emergency admission processed"
    );

    Ok(AdmissionOutcome {
        patient_id: patient_id.to_string(),
        note,
    })
}
