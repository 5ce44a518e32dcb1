use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identification event as reported by the scanning client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationEvent {
    pub patient_id: String,
    pub identification_timestamp: String,
    pub method: String,
    #[serde(default)]
    pub source: Option<String>,
    /// `data:<mimetype>;base64,<encoded_data>` excerpt of the captured frame.
    #[serde(default)]
    pub captured_data_snapshot: Option<String>,
}

/// Fingerprint of a captured snapshot. The raw image is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotReference {
    pub mime_type: String,
    pub sha256: String,
    pub byte_len: usize,
    /// False when the payload was cut short and the digest covers the raw text.
    pub complete: bool,
}

/// Audit record written once to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationRecord {
    pub log_id: String,
    pub patient_id: String,
    pub identified_at: DateTime<Utc>,
    pub method: String,
    pub source: Option<String>,
    pub snapshot: Option<SnapshotReference>,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationReceipt {
    pub log_id: String,
    pub message: String,
}
