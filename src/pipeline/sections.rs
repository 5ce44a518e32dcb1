//! Heuristic section extractor for legacy free-text prescription drafts.
//!
//! Only used when the model did not return the structured JSON shape.
//! Known limits, kept on purpose for compatibility with stored drafts:
//! list markers are assumed to be two characters wide (`1.`, `2.`, `- `),
//! so `10.` or `*` bullets are not recognised; and the disclaimer is
//! assumed to be the last section.
//!
//! A marker with nothing after it (a bare `-` or `1.`) adds no item, so
//! blank bullets never show up as empty rows on the slip.

use crate::models::PrescriptionSections;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Medications,
    Advice,
}

const ITEM_MARKERS: [&str; 3] = ["1.", "2.", "-"];

/// Partition prescription text into medications, advice and disclaimer.
///
/// Pure and deterministic. Never fails: when nothing is recognised the
/// whole input becomes the disclaimer.
pub fn extract_prescription_sections(text: &str) -> PrescriptionSections {
    let mut sections = PrescriptionSections::default();
    let mut current = Section::None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let lower = line.to_lowercase();
        if lower.contains("medication") {
            current = Section::Medications;
            continue;
        }
        if lower.contains("advice") {
            current = Section::Advice;
            continue;
        }
        if lower.contains("disclaimer") {
            sections.disclaimer = disclaimer_tail(text);
            break;
        }

        let target = match current {
            Section::Medications => &mut sections.medications,
            Section::Advice => &mut sections.advice,
            Section::None => continue,
        };
        if ITEM_MARKERS.iter().any(|m| line.starts_with(m)) {
            let item: String = line.chars().skip(2).collect();
            let item = item.trim();
            if !item.is_empty() {
                target.push(item.to_string());
            }
        }
    }

    if sections.is_empty() {
        sections.disclaimer = text.to_string();
    }
    sections
}

/// Original text from the first case-insensitive "disclaimer" onwards.
fn disclaimer_tail(text: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `text`
    let lower = text.to_ascii_lowercase();
    match lower.find("disclaimer") {
        Some(idx) => text[idx..].trim().to_string(),
        None => String::new(),
    }
}
