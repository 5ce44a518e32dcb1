//! Request validation.
//!
//! Every entry point validates its input here before any generation,
//! persistence or registry work happens. Failures are collected per field
//! so the desk can highlight all of them at once; nothing is committed
//! when any field fails.

use std::str::FromStr;
use std::sync::LazyLock;

use base64::Engine;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::models::{
    BloodGroup, ClinicalRequest, DraftKind, EmergencyAdmission, Gender, IdentificationEvent,
    NewPatient, NoteDraftRequest, OpdSlipRequest, PatientSnapshot, RegistrationRequest,
};

/// Minimum length for person names on the registration form.
const MIN_NAME_CHARS: usize = 2;

/// Upper bound on draft input text sent to the generation collaborator.
pub const MAX_DRAFT_INPUT_CHARS: usize = 20_000;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("valid regex"));

// ═══════════════════════════════════════════════════════════
// Error types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    MissingInput,
    TooShort,
    TooLong,
    NotPositiveInteger,
    InvalidChoice,
    InvalidFormat,
    ConsentRequired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub code: ValidationCode,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .fields.len())]
pub struct ValidationErrors {
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    fn new() -> Self {
        Self { fields: Vec::new() }
    }

    fn push(&mut self, field: &'static str, code: ValidationCode, message: impl Into<String>) {
        self.fields.push(FieldError {
            field,
            code,
            message: message.into(),
        });
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.fields.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }

    /// True when every failure is a missing required value.
    pub fn is_missing_input(&self) -> bool {
        !self.fields.is_empty()
            && self
                .fields
                .iter()
                .all(|f| f.code == ValidationCode::MissingInput)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

// ═══════════════════════════════════════════════════════════
// Registration
// ═══════════════════════════════════════════════════════════

/// Validate a registration form and normalise it into a `NewPatient`.
pub fn validate_registration(input: &RegistrationRequest) -> Result<NewPatient, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = input.name.trim();
    if name.chars().count() < MIN_NAME_CHARS {
        errors.push(
            "name",
            ValidationCode::TooShort,
            "Name must be at least 2 characters.",
        );
    }

    let age = match parse_positive_age(&input.age) {
        Some(age) => age,
        None => {
            errors.push(
                "age",
                ValidationCode::NotPositiveInteger,
                "Age must be a positive number.",
            );
            0
        }
    };

    let gender = match Gender::from_str(input.gender.trim()) {
        Ok(g) => Some(g),
        Err(_) => {
            errors.push(
                "gender",
                ValidationCode::InvalidChoice,
                "Please select a gender.",
            );
            None
        }
    };

    let blood_group = normalize_blood_group(&input.blood_group);
    if blood_group.is_empty() {
        errors.push(
            "bloodGroup",
            ValidationCode::MissingInput,
            "Blood group is required.",
        );
    }

    let contact_name = input.emergency_contact_name.trim();
    if contact_name.chars().count() < MIN_NAME_CHARS {
        errors.push(
            "emergencyContactName",
            ValidationCode::TooShort,
            "Emergency contact name is required.",
        );
    }

    let phone = input.emergency_contact_phone.trim();
    if !is_valid_phone(phone) {
        errors.push(
            "emergencyContactPhone",
            ValidationCode::InvalidFormat,
            "Invalid phone number format.",
        );
    }

    let face_image = input
        .facial_image
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(image) = face_image {
        if let Err(reason) = validate_image_reference(image) {
            errors.push("facialImage", ValidationCode::InvalidFormat, reason);
        }
    }

    errors.into_result(|| NewPatient {
        name: name.to_string(),
        age,
        // gender is Some whenever errors is empty
        gender: gender.unwrap_or(Gender::Other),
        blood_group,
        allergies: trimmed_or_empty(input.allergies.as_deref()),
        medical_conditions: trimmed_or_empty(input.medical_conditions.as_deref()),
        emergency_contact_name: contact_name.to_string(),
        emergency_contact_phone: phone.to_string(),
        face_image: face_image.map(str::to_string),
    })
}

/// Phone numbers follow a generic E.164-like shape: optional `+`, no leading zero, 2 to 15 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Accepts JSON integers and integer-valued numeric strings greater than zero.
fn parse_positive_age(value: &serde_json::Value) -> Option<u32> {
    let n = match value {
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u as f64
            } else {
                n.as_f64()?
            }
        }
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !n.is_finite() || n.fract() != 0.0 || n <= 0.0 || n > f64::from(u32::MAX) {
        return None;
    }
    Some(n as u32)
}

/// Canonicalise the 8 standard groups ("o+" → "O+"); keep anything else as typed.
fn normalize_blood_group(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match BloodGroup::from_str(&trimmed.to_uppercase()) {
        Ok(group) => group.as_str().to_string(),
        Err(_) => {
            tracing::warn!(value = trimmed, "Non-standard blood group accepted");
            trimmed.to_string()
        }
    }
}

fn trimmed_or_empty(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

// ═══════════════════════════════════════════════════════════
// Images and data URIs
// ═══════════════════════════════════════════════════════════

/// A decoded `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Parse a base64 data URI. Only the base64 form is accepted.
pub fn parse_data_uri(uri: &str) -> Result<DataUri, String> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| "Data URI must start with 'data:'".to_string())?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| "Data URI is missing its payload".to_string())?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| "Data URI must be base64 encoded".to_string())?;
    if mime_type.is_empty() || !mime_type.contains('/') {
        return Err("Data URI has no valid MIME type".into());
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("Data URI payload is not valid base64: {e}"))?;
    if bytes.is_empty() {
        return Err("Data URI payload is empty".into());
    }
    Ok(DataUri {
        mime_type: mime_type.to_ascii_lowercase(),
        bytes,
    })
}

/// A `data:` snapshot excerpt from the scanning client.
///
/// Clients may send only the start of a captured frame, so the payload is
/// kept as text and may not decode on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotExcerpt<'a> {
    pub mime_type: String,
    pub payload: &'a str,
}

/// Split a possibly truncated data URI. Only a missing `data:` prefix is an error.
pub fn parse_snapshot_excerpt(uri: &str) -> Result<SnapshotExcerpt<'_>, String> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| "Snapshot must be a data URI starting with 'data:'".to_string())?;
    let (header, payload) = rest.split_once(',').unwrap_or((rest, ""));
    let mime_type = header
        .split(';')
        .next()
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    Ok(SnapshotExcerpt {
        mime_type,
        payload: payload.trim(),
    })
}

/// A face image is either an http(s) URL or an embedded `image/*` data URI.
fn validate_image_reference(reference: &str) -> Result<(), String> {
    if reference.starts_with("data:") {
        let uri = parse_data_uri(reference)?;
        if !uri.mime_type.starts_with("image/") {
            return Err(format!("Unsupported image type: {}", uri.mime_type));
        }
        return Ok(());
    }
    if reference.starts_with("https://") || reference.starts_with("http://") {
        return Ok(());
    }
    Err("Face image must be an http(s) URL or an image data URI".into())
}

// ═══════════════════════════════════════════════════════════
// Clinical draft requests
// ═══════════════════════════════════════════════════════════

/// Reject a draft request whose primary text is empty, whitespace-only or oversized.
pub fn validate_clinical_request<R: ClinicalRequest>(request: &R) -> Result<(), ValidationErrors> {
    validate_primary_text(request.kind(), request.primary_text())
}

/// Note keywords must leave at least one entry once split on commas.
pub fn validate_note_request(request: &NoteDraftRequest) -> Result<(), ValidationErrors> {
    validate_clinical_request(request)?;
    let mut errors = ValidationErrors::new();
    if request.keyword_list().is_empty() {
        errors.push(
            DraftKind::Note.primary_field(),
            ValidationCode::MissingInput,
            format!("Please enter {}.", input_label(DraftKind::Note)),
        );
    }
    errors.into_result(|| ())
}

/// Validation for a raw primary field of the given kind.
pub fn validate_primary_text(kind: DraftKind, text: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let trimmed = text.trim();

    if trimmed.is_empty() {
        errors.push(
            kind.primary_field(),
            ValidationCode::MissingInput,
            format!("Please enter {}.", input_label(kind)),
        );
    } else if trimmed.chars().count() > MAX_DRAFT_INPUT_CHARS {
        errors.push(
            kind.primary_field(),
            ValidationCode::TooLong,
            format!("Input exceeds {MAX_DRAFT_INPUT_CHARS} characters."),
        );
    }

    errors.into_result(|| ())
}

fn input_label(kind: DraftKind) -> &'static str {
    match kind {
        DraftKind::SymptomAnalysis => "the patient's symptoms",
        DraftKind::ReportSummary => "the report text",
        DraftKind::Note => "consultation keywords",
        DraftKind::Prescription => "a diagnosis",
    }
}

// ═══════════════════════════════════════════════════════════
// Identification and admission
// ═══════════════════════════════════════════════════════════

/// Validate an identification event and return its parsed timestamp.
pub fn validate_identification(
    event: &IdentificationEvent,
) -> Result<DateTime<Utc>, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if event.patient_id.trim().is_empty() {
        errors.push("patientId", ValidationCode::MissingInput, "Patient ID is required.");
    }
    if event.method.trim().is_empty() {
        errors.push(
            "method",
            ValidationCode::MissingInput,
            "Identification method is required.",
        );
    }
    let timestamp = parse_timestamp(&event.identification_timestamp);
    if timestamp.is_none() {
        errors.push(
            "identificationTimestamp",
            ValidationCode::InvalidFormat,
            "Timestamp must be ISO 8601 (RFC 3339).",
        );
    }
    if let Some(snapshot) = event.captured_data_snapshot.as_deref() {
        if let Err(reason) = parse_snapshot_excerpt(snapshot.trim()) {
            errors.push("capturedDataSnapshot", ValidationCode::InvalidFormat, reason);
        }
    }

    errors.into_result(|| timestamp.unwrap_or_else(Utc::now))
}

/// Validate an emergency admission. Consent is mandatory.
pub fn validate_admission(
    admission: &EmergencyAdmission,
) -> Result<DateTime<Utc>, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if admission.patient_id.trim().is_empty() {
        errors.push("patientId", ValidationCode::MissingInput, "Patient ID is required.");
    }
    if !admission.consent_given {
        errors.push(
            "consentGiven",
            ValidationCode::ConsentRequired,
            "Consent must be given.",
        );
    }
    let admitted_at = parse_timestamp(&admission.date_time);
    if admitted_at.is_none() {
        errors.push(
            "dateTime",
            ValidationCode::InvalidFormat,
            "Admission time must be ISO 8601 (RFC 3339).",
        );
    }

    errors.into_result(|| admitted_at.unwrap_or_else(Utc::now))
}

/// Validate a walk-in slip request and return the snapshot to print.
pub fn validate_opd_request(request: &OpdSlipRequest) -> Result<PatientSnapshot, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if request.patient_id.trim().is_empty() {
        errors.push("patientId", ValidationCode::MissingInput, "Patient ID is required.");
    }
    if request.patient_name.trim().is_empty() {
        errors.push(
            "patientName",
            ValidationCode::MissingInput,
            "Patient name is required.",
        );
    }
    if request.patient_age == 0 {
        errors.push(
            "patientAge",
            ValidationCode::NotPositiveInteger,
            "Age must be a positive number.",
        );
    }

    errors.into_result(|| PatientSnapshot {
        id: request.patient_id.trim().to_string(),
        name: request.patient_name.trim().to_string(),
        age: request.patient_age,
        gender: request.patient_gender,
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        NoteDraftRequest, PrescriptionDraftRequest, ReportSummaryRequest, SymptomAnalysisRequest,
    };
    use serde_json::json;

    fn jane_roe() -> RegistrationRequest {
        RegistrationRequest {
            name: "Jane Roe".into(),
            age: json!(34),
            gender: "female".into(),
            blood_group: "O+".into(),
            allergies: None,
            medical_conditions: None,
            emergency_contact_name: "John Roe".into(),
            emergency_contact_phone: "+19876543210".into(),
            facial_image: None,
        }
    }

    #[test]
    fn accepts_reference_registration() {
        let patient = validate_registration(&jane_roe()).unwrap();
        assert_eq!(patient.name, "Jane Roe");
        assert_eq!(patient.age, 34);
        assert_eq!(patient.gender, Gender::Female);
        assert_eq!(patient.blood_group, "O+");
        assert_eq!(patient.allergies, "");
    }

    #[test]
    fn rejects_zero_negative_and_fractional_age() {
        for age in [json!(0), json!(-3), json!(34.5), json!("abc"), json!(null), json!(true)] {
            let mut req = jane_roe();
            req.age = age.clone();
            let err = validate_registration(&req).unwrap_err();
            assert!(err.has_field("age"), "age {age} should be rejected");
        }
    }

    #[test]
    fn coerces_integer_strings_for_age() {
        let mut req = jane_roe();
        req.age = json!(" 41 ");
        assert_eq!(validate_registration(&req).unwrap().age, 41);
    }

    #[test]
    fn rejects_malformed_phones() {
        for phone in ["", "0123456", "+0123456", "1", "+1234567890123456", "12-34-56", "phone"] {
            let mut req = jane_roe();
            req.emergency_contact_phone = phone.into();
            let err = validate_registration(&req).unwrap_err();
            assert!(err.has_field("emergencyContactPhone"), "{phone:?} accepted");
        }
    }

    #[test]
    fn shortest_phone_is_two_digits() {
        assert!(is_valid_phone("12"));
        assert!(!is_valid_phone("1"));
        assert!(!is_valid_phone("+1"));
    }

    #[test]
    fn accepts_phone_without_plus() {
        assert!(is_valid_phone("919876543210"));
        assert!(is_valid_phone("+44"));
        assert!(!is_valid_phone("+4"));
    }

    #[test]
    fn collects_all_field_errors() {
        let req = RegistrationRequest {
            name: "J".into(),
            age: json!(0),
            gender: "unknown".into(),
            blood_group: "  ".into(),
            allergies: None,
            medical_conditions: None,
            emergency_contact_name: "".into(),
            emergency_contact_phone: "abc".into(),
            facial_image: None,
        };
        let err = validate_registration(&req).unwrap_err();
        assert_eq!(err.fields.len(), 6);
        for field in [
            "name",
            "age",
            "gender",
            "bloodGroup",
            "emergencyContactName",
            "emergencyContactPhone",
        ] {
            assert!(err.has_field(field), "missing error for {field}");
        }
    }

    #[test]
    fn normalizes_standard_blood_groups() {
        let mut req = jane_roe();
        req.blood_group = " ab- ".into();
        assert_eq!(validate_registration(&req).unwrap().blood_group, "AB-");

        req.blood_group = "Bombay (hh)".into();
        assert_eq!(validate_registration(&req).unwrap().blood_group, "Bombay (hh)");
    }

    #[test]
    fn face_image_must_be_url_or_image_data_uri() {
        let mut req = jane_roe();
        req.facial_image = Some("data:image/png;base64,iVBORw0KGgo=".into());
        assert!(validate_registration(&req).is_ok());

        req.facial_image = Some("https://cdn.example.org/faces/1.jpg".into());
        assert!(validate_registration(&req).is_ok());

        req.facial_image = Some("data:text/plain;base64,aGVsbG8=".into());
        assert!(validate_registration(&req).unwrap_err().has_field("facialImage"));

        req.facial_image = Some("data:image/png;base64,***".into());
        assert!(validate_registration(&req).unwrap_err().has_field("facialImage"));
    }

    #[test]
    fn parse_data_uri_decodes_payload() {
        let uri = parse_data_uri("data:image/JPEG;base64,aGVsbG8=").unwrap();
        assert_eq!(uri.mime_type, "image/jpeg");
        assert_eq!(uri.bytes, b"hello");
        assert!(parse_data_uri("data:image/png,plain").is_err());
        assert!(parse_data_uri("image/png;base64,aGVsbG8=").is_err());
    }

    #[test]
    fn empty_primary_field_is_missing_input_for_every_kind() {
        let blank = "  \n\t ";
        let results = [
            validate_clinical_request(&SymptomAnalysisRequest {
                symptoms: blank.into(),
                patient_name: Some("Jane".into()),
            }),
            validate_clinical_request(&ReportSummaryRequest {
                report_text: blank.into(),
            }),
            validate_clinical_request(&NoteDraftRequest {
                keywords: String::new(),
            }),
            validate_clinical_request(&PrescriptionDraftRequest {
                diagnosis: blank.into(),
            }),
        ];
        for result in results {
            let err = result.unwrap_err();
            assert!(err.is_missing_input());
        }
    }

    #[test]
    fn missing_input_names_the_primary_field() {
        let err = validate_clinical_request(&ReportSummaryRequest {
            report_text: String::new(),
        })
        .unwrap_err();
        assert_eq!(err.fields[0].field, "reportText");
    }

    #[test]
    fn oversized_input_is_too_long() {
        let err = validate_primary_text(DraftKind::Prescription, &"x".repeat(MAX_DRAFT_INPUT_CHARS + 1))
            .unwrap_err();
        assert_eq!(err.fields[0].code, ValidationCode::TooLong);
        assert!(!err.is_missing_input());
    }

    #[test]
    fn identification_requires_rfc3339_timestamp() {
        let mut event = IdentificationEvent {
            patient_id: "patient-1".into(),
            identification_timestamp: "2026-10-19T08:15:00Z".into(),
            method: "face-scan".into(),
            source: None,
            captured_data_snapshot: None,
        };
        assert!(validate_identification(&event).is_ok());

        event.identification_timestamp = "yesterday".into();
        let err = validate_identification(&event).unwrap_err();
        assert!(err.has_field("identificationTimestamp"));
    }

    #[test]
    fn truncated_snapshot_is_accepted_but_plain_text_is_not() {
        let full = format!("data:image/jpeg;base64,{}", "/9j/4AAQSkZJRgABAQ".repeat(20));
        let mut event = IdentificationEvent {
            patient_id: "patient-1".into(),
            identification_timestamp: "2026-10-19T08:15:00Z".into(),
            method: "face-scan".into(),
            source: None,
            captured_data_snapshot: Some(full[..100].to_string()),
        };
        assert!(validate_identification(&event).is_ok());

        event.captured_data_snapshot = Some("snapshot-0042.jpg".into());
        let err = validate_identification(&event).unwrap_err();
        assert!(err.has_field("capturedDataSnapshot"));
    }

    #[test]
    fn snapshot_excerpt_keeps_mime_from_header() {
        let excerpt = parse_snapshot_excerpt("data:IMAGE/JPEG;base64,/9j/4AA").unwrap();
        assert_eq!(excerpt.mime_type, "image/jpeg");
        assert_eq!(excerpt.payload, "/9j/4AA");

        let headless = parse_snapshot_excerpt("data:").unwrap();
        assert_eq!(headless.mime_type, "application/octet-stream");
        assert_eq!(headless.payload, "");
    }

    #[test]
    fn note_keywords_of_only_commas_are_missing() {
        let err = validate_note_request(&NoteDraftRequest {
            keywords: " , ,".into(),
        })
        .unwrap_err();
        assert!(err.is_missing_input());
        assert_eq!(err.fields[0].field, "keywords");

        assert!(validate_note_request(&NoteDraftRequest {
            keywords: "fever, ,cough".into(),
        })
        .is_ok());
    }

    #[test]
    fn opd_request_needs_name_and_age() {
        let request = OpdSlipRequest {
            patient_id: "walk-in-7".into(),
            patient_name: " ".into(),
            patient_age: 0,
            patient_gender: Gender::Other,
            doctor_name: None,
        };
        let err = validate_opd_request(&request).unwrap_err();
        assert!(err.has_field("patientName"));
        assert!(err.has_field("patientAge"));
        assert!(!err.has_field("patientId"));
    }

    #[test]
    fn admission_requires_consent() {
        let admission = EmergencyAdmission {
            patient_id: "patient-1".into(),
            admission_notes: None,
            consent_given: false,
            date_time: "2026-10-19T08:15:00+05:30".into(),
            name: "Jane Roe".into(),
            age: 34,
            blood_group: "O+".into(),
            allergies: None,
            medical_conditions: None,
        };
        let err = validate_admission(&admission).unwrap_err();
        assert_eq!(err.fields[0].code, ValidationCode::ConsentRequired);
    }
}
