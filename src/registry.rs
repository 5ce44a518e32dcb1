//! In-memory patient registry.
//!
//! The registry lives for the lifetime of the process and is passed around
//! explicitly (behind `Arc<dyn PatientRepository>`) so each test can build
//! its own isolated instance. Every method takes the lock once, which makes
//! each call atomic with respect to concurrent API handlers.

use std::str::FromStr;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::random_base36;
use crate::models::{MedicalNote, NewPatient, Patient};

/// Length of the random suffix on generated patient ids.
const PATIENT_ID_SUFFIX_LEN: usize = 6;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("Patient id already registered: {0}")]
    DuplicateId(String),

    #[error("Note content is empty")]
    EmptyNote,

    #[error("Registry lock poisoned")]
    LockPoisoned,
}

/// What `add_patient` does when the id is already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateIdPolicy {
    /// Keep both records. Lookups return the first one.
    #[default]
    Allow,
    Reject,
    /// Replace the stored record, history included.
    Overwrite,
}

/// What `append_note` does when the id is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPatientPolicy {
    /// Silently succeed with `Ok(None)`.
    #[default]
    Ignore,
    NotFound,
}

impl FromStr for DuplicateIdPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "reject" => Ok(Self::Reject),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(format!("unknown duplicate id policy: {other}")),
        }
    }
}

impl FromStr for UnknownPatientPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "not_found" | "notfound" | "not-found" => Ok(Self::NotFound),
            other => Err(format!("unknown patient policy: {other}")),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Repository trait
// ═══════════════════════════════════════════════════════════

/// Storage seam for patient records.
pub trait PatientRepository: Send + Sync {
    fn add_patient(&self, patient: Patient) -> Result<(), RegistryError>;

    fn get_patient_by_id(&self, id: &str) -> Result<Option<Patient>, RegistryError>;

    /// Append a note to a patient's history.
    ///
    /// Returns the stored note, or `Ok(None)` when the patient is unknown
    /// and the registry ignores unknown ids.
    fn append_note(
        &self,
        patient_id: &str,
        content: &str,
    ) -> Result<Option<MedicalNote>, RegistryError>;

    /// All patients in registration order.
    fn list_patients(&self) -> Result<Vec<Patient>, RegistryError>;
}

/// Generate a patient id: `patient-<epoch millis>-<random>`.
pub fn generate_patient_id(now: DateTime<Utc>) -> String {
    format!(
        "patient-{}-{}",
        now.timestamp_millis(),
        random_base36(PATIENT_ID_SUFFIX_LEN)
    )
}

/// Give a validated registration an id and store it.
pub fn register_patient(
    repo: &dyn PatientRepository,
    new_patient: NewPatient,
) -> Result<Patient, RegistryError> {
    let now = Utc::now();
    let patient = new_patient.into_patient(generate_patient_id(now), now);
    repo.add_patient(patient.clone())?;
    tracing::info!(patient_id = %patient.id, "Patient registered");
    Ok(patient)
}

// ═══════════════════════════════════════════════════════════
// In-memory implementation
// ═══════════════════════════════════════════════════════════

pub struct InMemoryPatientRegistry {
    patients: RwLock<Vec<Patient>>,
    duplicate_ids: DuplicateIdPolicy,
    unknown_patients: UnknownPatientPolicy,
}

impl InMemoryPatientRegistry {
    pub fn new() -> Self {
        Self::with_policies(DuplicateIdPolicy::default(), UnknownPatientPolicy::default())
    }

    pub fn with_policies(
        duplicate_ids: DuplicateIdPolicy,
        unknown_patients: UnknownPatientPolicy,
    ) -> Self {
        Self {
            patients: RwLock::new(Vec::new()),
            duplicate_ids,
            unknown_patients,
        }
    }
}

impl Default for InMemoryPatientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientRepository for InMemoryPatientRegistry {
    fn add_patient(&self, mut patient: Patient) -> Result<(), RegistryError> {
        patient.medical_history.clear();
        let mut patients = self
            .patients
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;

        let existing = patients.iter().position(|p| p.id == patient.id);
        match (existing, self.duplicate_ids) {
            (Some(_), DuplicateIdPolicy::Reject) => {
                return Err(RegistryError::DuplicateId(patient.id));
            }
            (Some(idx), DuplicateIdPolicy::Overwrite) => {
                tracing::warn!(patient_id = %patient.id, "Overwriting patient with duplicate id");
                patients[idx] = patient;
            }
            (Some(_), DuplicateIdPolicy::Allow) => {
                tracing::warn!(patient_id = %patient.id, "Duplicate patient id stored");
                patients.push(patient);
            }
            (None, _) => patients.push(patient),
        }
        Ok(())
    }

    fn get_patient_by_id(&self, id: &str) -> Result<Option<Patient>, RegistryError> {
        let patients = self
            .patients
            .read()
            .map_err(|_| RegistryError::LockPoisoned)?;
        Ok(patients.iter().find(|p| p.id == id).cloned())
    }

    fn append_note(
        &self,
        patient_id: &str,
        content: &str,
    ) -> Result<Option<MedicalNote>, RegistryError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(RegistryError::EmptyNote);
        }

        let mut patients = self
            .patients
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;

        let Some(patient) = patients.iter_mut().find(|p| p.id == patient_id) else {
            return match self.unknown_patients {
                UnknownPatientPolicy::Ignore => {
                    tracing::debug!(patient_id, "Note for unknown patient ignored");
                    Ok(None)
                }
                UnknownPatientPolicy::NotFound => {
                    Err(RegistryError::NotFound(patient_id.to_string()))
                }
            };
        };

        let note = MedicalNote {
            timestamp: Utc::now(),
            content: content.to_string(),
        };
        patient.medical_history.push(note.clone());
        tracing::info!(
            patient_id,
            history_len = patient.medical_history.len(),
            "Note appended"
        );
        Ok(Some(note))
    }

    fn list_patients(&self) -> Result<Vec<Patient>, RegistryError> {
        let patients = self
            .patients
            .read()
            .map_err(|_| RegistryError::LockPoisoned)?;
        Ok(patients.clone())
    }
}
