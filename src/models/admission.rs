use serde::{Deserialize, Serialize};

/// Emergency admission and consent form, filled after identification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyAdmission {
    pub patient_id: String,
    #[serde(default)]
    pub admission_notes: Option<String>,
    pub consent_given: bool,
    pub date_time: String,
    pub name: String,
    pub age: u32,
    pub blood_group: String,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub medical_conditions: Option<String>,
}
