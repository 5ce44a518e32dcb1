//! Identification event logging.
//!
//! Face matching itself happens outside this service; we only record that an
//! identification took place. Captured frames are reduced to a SHA-256
//! fingerprint before they reach the record store.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::ids::random_base36;
use crate::models::{
    IdentificationEvent, IdentificationReceipt, IdentificationRecord, SnapshotReference,
};
use crate::store::{PersistenceStatus, RecordStore};
use crate::validation::{parse_snapshot_excerpt, validate_identification, ValidationErrors};

const LOG_ID_SUFFIX_LEN: usize = 7;

#[derive(Debug, Clone, Serialize)]
pub struct IdentificationOutcome {
    #[serde(flatten)]
    pub receipt: IdentificationReceipt,
    pub persistence: PersistenceStatus,
}

/// Validate, fingerprint and store an identification event.
///
/// A store failure does not fail the call; it is reported in `persistence`.
pub fn log_identification_event(
    event: &IdentificationEvent,
    store: &dyn RecordStore,
) -> Result<IdentificationOutcome, ValidationErrors> {
    let identified_at = validate_identification(event)?;
    let logged_at = Utc::now();

    let record = IdentificationRecord {
        log_id: format!(
            "log-{}-{}",
            logged_at.timestamp_millis(),
            random_base36(LOG_ID_SUFFIX_LEN)
        ),
        patient_id: event.patient_id.trim().to_string(),
        identified_at,
        method: event.method.trim().to_string(),
        source: event
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        snapshot: event
            .captured_data_snapshot
            .as_deref()
            .and_then(|s| fingerprint_snapshot(s.trim())),
        logged_at,
    };

    let persistence = PersistenceStatus::from_result(store.save_identification_event(&record));
    if let Some(error) = &persistence.error {
        tracing::warn!(log_id = %record.log_id, error = %error, "Identification event not stored");
    }

    tracing::info!(
        log_id = %record.log_id,
        patient_id = %record.patient_id,
        method = %record.method,
        has_snapshot = record.snapshot.is_some(),
        "Identification event logged"
    );

    Ok(IdentificationOutcome {
        receipt: IdentificationReceipt {
            message: format!(
                "Identification event for patient {} logged successfully. Log ID: {}",
                record.patient_id, record.log_id
            ),
            log_id: record.log_id,
        },
        persistence,
    })
}

/// Reduce a data URI to MIME type, digest and size.
///
/// Kiosks send short excerpts of the frame, so the payload may be cut in the
/// middle of a base64 quantum. Such payloads are hashed as raw text and the
/// reference is marked incomplete.
pub fn fingerprint_snapshot(data_uri: &str) -> Option<SnapshotReference> {
    let excerpt = parse_snapshot_excerpt(data_uri).ok()?;
    let decoded = STANDARD
        .decode(excerpt.payload)
        .ok()
        .filter(|bytes| !bytes.is_empty());
    let complete = decoded.is_some();
    let bytes = decoded.unwrap_or_else(|| excerpt.payload.as_bytes().to_vec());
    let digest = Sha256::digest(&bytes);
    Some(SnapshotReference {
        mime_type: excerpt.mime_type,
        sha256: format!("{digest:x}"),
        byte_len: bytes.len(),
        complete,
    })
}
