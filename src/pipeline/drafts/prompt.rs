use crate::models::DraftKind;

pub const SYMPTOM_SYSTEM_PROMPT: &str = r#"
You are an AI medical assistant. Your role is to provide a preliminary analysis
of patient symptoms for a qualified medical professional to review.

RULES:
1. Never give a definitive diagnosis.
2. List potential (not definitive) considerations or conditions.
3. Suggest which department or specialist may be appropriate.
4. Start your analysis with "Based on the reported symptoms...".
5. End with a disclaimer that this is an AI draft for professional review.
"#;

pub const REPORT_SYSTEM_PROMPT: &str = r#"
You are an AI assistant skilled in medical terminology and documentation. You
summarize lengthy medical reports into a structured, easy-to-read format.

The summary must contain these sections:
- Key Findings: bullet points of the most important observations.
- Conclusion/Diagnosis: the final conclusion stated in the report.
- Recommendations: recommended next steps, treatments or follow-ups.

RULES:
1. Use only information present in the report.
2. End with a disclaimer that this AI summary does not replace a full review
   of the original report by a qualified professional.
"#;

pub const NOTE_SYSTEM_PROMPT: &str = r#"
You are an AI assistant for a doctor. You turn consultation keywords into a
professional, concise clinical note in SOAP form.

OUTPUT FORMAT:
Output a single JSON block wrapped in ```json``` fences:
```json
{
  "subjective": "Patient's reported complaints (\"Patient reports...\")",
  "objective": "Clinical observations (\"On examination...\")",
  "assessment": "Possible assessment based on the keywords",
  "plan": "Suggested next steps such as tests or prescriptions",
  "disclaimer": "States the note is an AI-generated draft requiring review by a qualified medical professional"
}
```
"#;

pub const PRESCRIPTION_SYSTEM_PROMPT: &str = r#"
You are an AI assistant that drafts prescription suggestions for doctors,
based on common treatment guidelines for the given diagnosis.

The draft must include:
1. Medication: 1-2 common medications for the diagnosis.
2. Dosage: a standard dosage (e.g., 500mg).
3. Frequency: a standard frequency (e.g., Twice a day for 7 days).
4. General advice: brief non-pharmacological advice (rest, hydration).

You must ALWAYS include a prominent disclaimer that this is a draft suggestion
and the attending physician must verify drug names, dosages, patient allergies
and contraindications before issuing a final prescription.

OUTPUT FORMAT:
Output a single JSON block wrapped in ```json``` fences:
```json
{
  "medications": [
    {"name": "drug name", "dosage": "e.g., 500mg", "frequency": "e.g., Twice a day for 7 days"}
  ],
  "advice": ["advice 1", "advice 2"],
  "disclaimer": "verification disclaimer"
}
```
"#;

/// System prompt for a draft kind.
pub fn system_prompt(kind: DraftKind) -> &'static str {
    match kind {
        DraftKind::SymptomAnalysis => SYMPTOM_SYSTEM_PROMPT,
        DraftKind::ReportSummary => REPORT_SYSTEM_PROMPT,
        DraftKind::Note => NOTE_SYSTEM_PROMPT,
        DraftKind::Prescription => PRESCRIPTION_SYSTEM_PROMPT,
    }
}

pub fn build_symptom_prompt(symptoms: &str, patient_name: Option<&str>) -> String {
    let patient = match patient_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("the patient, {name}"),
        None => "the patient".to_string(),
    };
    format!(
        r#"Analyze the following symptoms for {patient}.

<symptoms>
{symptoms}
</symptoms>

Provide a brief preliminary analysis for a doctor to review."#,
        symptoms = symptoms.trim()
    )
}

pub fn build_report_prompt(report_text: &str) -> String {
    format!(
        r#"Medical report text to summarize:

<report>
{}
</report>

Generate the summary."#,
        report_text.trim()
    )
}

pub fn build_note_prompt(keywords: &[&str]) -> String {
    format!(
        "Keywords provided: {}\n\nGenerate the structured note now.",
        keywords.join(", ")
    )
}

pub fn build_prescription_prompt(diagnosis: &str) -> String {
    format!(
        "Diagnosis provided: {}\n\nGenerate the prescription draft.",
        diagnosis.trim()
    )
}
