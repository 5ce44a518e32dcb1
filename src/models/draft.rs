//! Request and response shapes for the four clinical draft kinds.

use serde::{Deserialize, Serialize};

use super::enums::DraftKind;

/// A draft request: one primary free-text field plus optional context.
pub trait ClinicalRequest {
    fn kind(&self) -> DraftKind;
    fn primary_text(&self) -> &str;
}

// ═══════════════════════════════════════════════════════════
// Requests
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomAnalysisRequest {
    pub symptoms: String,
    #[serde(default)]
    pub patient_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummaryRequest {
    pub report_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraftRequest {
    /// Comma-separated consultation keywords.
    pub keywords: String,
}

impl NoteDraftRequest {
    pub fn keyword_list(&self) -> Vec<&str> {
        self.keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionDraftRequest {
    pub diagnosis: String,
}

impl ClinicalRequest for SymptomAnalysisRequest {
    fn kind(&self) -> DraftKind {
        DraftKind::SymptomAnalysis
    }
    fn primary_text(&self) -> &str {
        &self.symptoms
    }
}

impl ClinicalRequest for ReportSummaryRequest {
    fn kind(&self) -> DraftKind {
        DraftKind::ReportSummary
    }
    fn primary_text(&self) -> &str {
        &self.report_text
    }
}

impl ClinicalRequest for NoteDraftRequest {
    fn kind(&self) -> DraftKind {
        DraftKind::Note
    }
    fn primary_text(&self) -> &str {
        &self.keywords
    }
}

impl ClinicalRequest for PrescriptionDraftRequest {
    fn kind(&self) -> DraftKind {
        DraftKind::Prescription
    }
    fn primary_text(&self) -> &str {
        &self.diagnosis
    }
}

// ═══════════════════════════════════════════════════════════
// Responses
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomAnalysis {
    pub analysis: String,
    pub disclaimer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub summary: String,
    pub disclaimer: String,
}

/// SOAP sections, present when the model answered with structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSections {
    pub subjective: String,
    pub objective: String,
    pub assessment: String,
    pub plan: String,
}

impl NoteSections {
    pub fn render(&self) -> String {
        format!(
            "Subjective:\n{}\n\nObjective:\n{}\n\nAssessment:\n{}\n\nPlan:\n{}",
            self.subjective, self.objective, self.assessment, self.plan
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<NoteSections>,
    pub disclaimer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationSuggestion {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
}

impl MedicationSuggestion {
    pub fn display_line(&self) -> String {
        let mut line = self.name.trim().to_string();
        if !self.dosage.trim().is_empty() {
            line.push(' ');
            line.push_str(self.dosage.trim());
        }
        if !self.frequency.trim().is_empty() {
            line.push_str(", ");
            line.push_str(self.frequency.trim());
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredPrescription {
    pub medications: Vec<MedicationSuggestion>,
    pub advice: Vec<String>,
    pub disclaimer: String,
}

/// A prescription draft is either the structured shape or a legacy text blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum PrescriptionDraft {
    Structured(StructuredPrescription),
    Legacy { text: String },
}

/// Display partition of a prescription draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionSections {
    pub medications: Vec<String>,
    pub advice: Vec<String>,
    pub disclaimer: String,
}

impl PrescriptionSections {
    pub fn is_empty(&self) -> bool {
        self.medications.is_empty() && self.advice.is_empty() && self.disclaimer.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionResponse {
    pub draft: PrescriptionDraft,
    pub sections: PrescriptionSections,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_list_splits_and_trims() {
        let req = NoteDraftRequest {
            keywords: " fever, cough ,, sore throat ".into(),
        };
        assert_eq!(req.keyword_list(), vec!["fever", "cough", "sore throat"]);
    }

    #[test]
    fn requests_report_their_kind() {
        let req = PrescriptionDraftRequest {
            diagnosis: "Acute bronchitis".into(),
        };
        assert_eq!(req.kind(), DraftKind::Prescription);
        assert_eq!(req.primary_text(), "Acute bronchitis");
    }

    #[test]
    fn report_request_uses_camel_case() {
        let req: ReportSummaryRequest =
            serde_json::from_str(r#"{"reportText":"CT chest: no acute findings."}"#).unwrap();
        assert_eq!(req.report_text, "CT chest: no acute findings.");
    }

    #[test]
    fn medication_display_line() {
        let med = MedicationSuggestion {
            name: "Amoxicillin".into(),
            dosage: "500mg".into(),
            frequency: "Twice a day for 7 days".into(),
        };
        assert_eq!(med.display_line(), "Amoxicillin 500mg, Twice a day for 7 days");

        let bare = MedicationSuggestion {
            name: "Paracetamol".into(),
            dosage: String::new(),
            frequency: String::new(),
        };
        assert_eq!(bare.display_line(), "Paracetamol");
    }

    #[test]
    fn prescription_draft_is_tagged_by_format() {
        let legacy = PrescriptionDraft::Legacy {
            text: "Advice\n- Rest".into(),
        };
        let json = serde_json::to_value(&legacy).unwrap();
        assert_eq!(json["format"], "legacy");
        assert_eq!(json["text"], "Advice\n- Rest");
    }
}
