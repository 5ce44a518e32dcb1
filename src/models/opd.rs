use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Gender;

/// Outpatient queue slip. Created once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpdSlip {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub patient_age: u32,
    pub patient_gender: Gender,
    pub token_number: String,
    pub slip_date: DateTime<Utc>,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
}

/// Walk-in slip request carrying its own patient snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpdSlipRequest {
    pub patient_id: String,
    pub patient_name: String,
    pub patient_age: u32,
    pub patient_gender: Gender,
    #[serde(default)]
    pub doctor_name: Option<String>,
}
