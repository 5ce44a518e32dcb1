use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Gender;

/// Registration form as submitted by the desk.
///
/// `age` and `gender` stay loosely typed, and every field may be absent,
/// so that malformed or missing input surfaces as a field-level
/// validation error instead of a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: serde_json::Value,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub blood_group: String,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub medical_conditions: Option<String>,
    #[serde(default)]
    pub emergency_contact_name: String,
    #[serde(default)]
    pub emergency_contact_phone: String,
    #[serde(default)]
    pub facial_image: Option<String>,
}

/// A registration that passed validation, ready to become a `Patient`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub blood_group: String,
    pub allergies: String,
    pub medical_conditions: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub face_image: Option<String>,
}

impl NewPatient {
    /// Attach an id and creation time. The history always starts empty.
    pub fn into_patient(self, id: String, created_at: DateTime<Utc>) -> Patient {
        Patient {
            id,
            name: self.name,
            age: self.age,
            gender: self.gender,
            blood_group: self.blood_group,
            allergies: self.allergies,
            medical_conditions: self.medical_conditions,
            emergency_contact_name: self.emergency_contact_name,
            emergency_contact_phone: self.emergency_contact_phone,
            face_image: self.face_image,
            created_at,
            medical_history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub blood_group: String,
    pub allergies: String,
    pub medical_conditions: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_image: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub medical_history: Vec<MedicalNote>,
}

impl Patient {
    pub fn snapshot(&self) -> PatientSnapshot {
        PatientSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            age: self.age,
            gender: self.gender,
        }
    }

    pub fn has_allergies(&self) -> bool {
        !self.allergies.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalNote {
    pub timestamp: DateTime<Utc>,
    pub content: String,
}

/// Identity fields copied onto an OPD slip at generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSnapshot {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
}

/// Dashboard list row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub blood_group: String,
    pub has_allergies: bool,
    pub note_count: usize,
}

impl From<&Patient> for PatientSummary {
    fn from(p: &Patient) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            age: p.age,
            gender: p.gender,
            blood_group: p.blood_group.clone(),
            has_allergies: p.has_allergies(),
            note_count: p.medical_history.len(),
        }
    }
}
