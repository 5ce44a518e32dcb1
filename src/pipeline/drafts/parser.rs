//! Structured-output parsing for note and prescription drafts.
//!
//! Both kinds ask the model for a fenced JSON block. When the block is
//! missing or unusable the caller falls back to the free-text path.

use serde::Deserialize;

use crate::models::{MedicationSuggestion, NoteSections};

/// Parsed note JSON; the disclaimer may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNote {
    pub sections: NoteSections,
    pub disclaimer: Option<String>,
}

/// Parsed prescription JSON; the disclaimer may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPrescription {
    pub medications: Vec<MedicationSuggestion>,
    pub advice: Vec<String>,
    pub disclaimer: Option<String>,
}

/// Locate the JSON payload: a ```json fence, a bare ``` fence, or a
/// response that is itself a JSON object.
pub fn extract_json_block(response: &str) -> Option<&str> {
    for fence in ["```json", "```JSON", "```"] {
        if let Some(start) = response.find(fence) {
            let content_start = start + fence.len();
            let end = response[content_start..].find("```")?;
            let block = response[content_start..content_start + end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }

    let trimmed = response.trim();
    (trimmed.starts_with('{') && trimmed.ends_with('}')).then_some(trimmed)
}

/// Parse SOAP sections. Requires at least one non-empty section.
pub fn parse_note_response(response: &str) -> Option<ParsedNote> {
    #[derive(Deserialize)]
    struct RawNote {
        #[serde(default)]
        subjective: Option<String>,
        #[serde(default)]
        objective: Option<String>,
        #[serde(default)]
        assessment: Option<String>,
        #[serde(default)]
        plan: Option<String>,
        #[serde(default)]
        disclaimer: Option<String>,
    }

    let json = extract_json_block(response)?;
    let raw: RawNote = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(error = %e, "Note JSON unusable, using free text");
            return None;
        }
    };

    let clean = |s: Option<String>| s.map(|v| v.trim().to_string()).unwrap_or_default();
    let sections = NoteSections {
        subjective: clean(raw.subjective),
        objective: clean(raw.objective),
        assessment: clean(raw.assessment),
        plan: clean(raw.plan),
    };

    let any_content = [
        &sections.subjective,
        &sections.objective,
        &sections.assessment,
        &sections.plan,
    ]
    .iter()
    .any(|s| !s.is_empty());

    any_content.then_some(ParsedNote {
        sections,
        disclaimer: raw.disclaimer,
    })
}

/// Parse the structured prescription. Requires at least one medication or advice item.
pub fn parse_prescription_response(response: &str) -> Option<ParsedPrescription> {
    #[derive(Deserialize)]
    struct RawPrescription {
        #[serde(default)]
        medications: Option<Vec<serde_json::Value>>,
        #[serde(default)]
        advice: Option<serde_json::Value>,
        #[serde(default)]
        disclaimer: Option<String>,
    }

    let json = extract_json_block(response)?;
    let raw: RawPrescription = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(error = %e, "Prescription JSON unusable, using free text");
            return None;
        }
    };

    let medications: Vec<MedicationSuggestion> = raw
        .medications
        .unwrap_or_default()
        .iter()
        .filter_map(parse_medication_lenient)
        .collect();
    let advice = parse_advice(raw.advice);

    if medications.is_empty() && advice.is_empty() {
        return None;
    }

    Some(ParsedPrescription {
        medications,
        advice,
        disclaimer: raw.disclaimer,
    })
}

/// Accepts `{name, dosage, frequency}` with common aliases, skipping nameless entries.
fn parse_medication_lenient(value: &serde_json::Value) -> Option<MedicationSuggestion> {
    #[derive(Deserialize)]
    struct RawMedication {
        #[serde(alias = "medication", alias = "drug")]
        name: Option<String>,
        #[serde(default, alias = "dose")]
        dosage: Option<String>,
        #[serde(default)]
        frequency: Option<String>,
    }

    let raw: RawMedication = serde_json::from_value(value.clone()).ok()?;
    let name = raw.name?.trim().to_string();
    if name.is_empty() {
        return None;
    }
    Some(MedicationSuggestion {
        name,
        dosage: raw.dosage.unwrap_or_default().trim().to_string(),
        frequency: raw.frequency.unwrap_or_default().trim().to_string(),
    })
}

/// Advice may arrive as an array of strings or a single string.
fn parse_advice(value: Option<serde_json::Value>) -> Vec<String> {
    let items: Vec<String> = match value {
        Some(serde_json::Value::Array(arr)) => arr
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(serde_json::Value::String(s)) => vec![s],
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
