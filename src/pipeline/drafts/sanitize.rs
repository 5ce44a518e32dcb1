//! Post-generation cleanup and disclaimer handling.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::DraftKind;

static THINK_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));
static UNUSED_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<unused\d+>").expect("valid regex"));
static DISCLAIMER_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[\s>*_#-]*disclaimer\b[*_]*\s*:?").expect("valid regex")
});

/// Strip model artifacts from raw output.
///
/// Handles `<think>` blocks, the `<unusedN>thought\n` prefix emitted by
/// Gemma-family models, and stray `<unusedN>` tokens.
pub fn sanitize_llm_output(raw: &str) -> String {
    let mut text = THINK_BLOCK_RE.replace_all(raw, "").to_string();

    if let Some(idx) = text.find("<unused") {
        if let Some(thought_offset) = text[idx..].find("thought\n") {
            text = text[idx + thought_offset + 8..].to_string();
        }
    }

    text = UNUSED_TOKEN_RE.replace_all(&text, "").to_string();
    text.trim().to_string()
}

/// Disclaimer attached when the model did not provide one.
pub fn default_disclaimer(kind: DraftKind) -> &'static str {
    match kind {
        DraftKind::SymptomAnalysis => {
            "Disclaimer: This is an AI-generated preliminary analysis, not a diagnosis. \
             It must be reviewed by a qualified medical professional."
        }
        DraftKind::ReportSummary => {
            "Disclaimer: This is an AI-generated summary and does not replace a full review \
             of the original report by a qualified professional."
        }
        DraftKind::Note => {
            "Disclaimer: This note is an AI-generated draft and requires review by a \
             qualified medical professional."
        }
        DraftKind::Prescription => {
            "Disclaimer: This is an AI-generated draft suggestion. The attending physician \
             must verify drug names, dosages, patient allergies and contraindications \
             before issuing a final prescription."
        }
    }
}

/// Use the model's disclaimer when it is non-empty, the kind's default otherwise.
pub fn ensure_disclaimer(disclaimer: Option<&str>, kind: DraftKind) -> String {
    match disclaimer.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => d.to_string(),
        None => {
            tracing::debug!(kind = %kind, "Default disclaimer attached");
            default_disclaimer(kind).to_string()
        }
    }
}

/// Split free text at its first line that opens with "Disclaimer".
///
/// Returns `(body, disclaimer)`; the disclaimer runs to the end of the text.
pub fn split_trailing_disclaimer(text: &str) -> (String, Option<String>) {
    match DISCLAIMER_LINE_RE.find(text) {
        Some(m) => {
            let body = text[..m.start()].trim().to_string();
            let disclaimer = text[m.start()..]
                .trim()
                .trim_start_matches(['*', '_', '#', '>', '-', ' '])
                .replace("**", "");
            (body, Some(disclaimer).filter(|d| !d.is_empty()))
        }
        None => (text.trim().to_string(), None),
    }
}
