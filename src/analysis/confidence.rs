//! Confidence scoring for the unstructured-text parse path.

use crate::models::{RecordDescriptor, RecordType};

/// Bounds for text-derived confidence.
pub const TEXT_CONFIDENCE_MIN: f32 = 0.60;
pub const TEXT_CONFIDENCE_MAX: f32 = 0.95;

/// Derive a bounded confidence score from coarse signals in the raw text.
/// Used only when the provider reply could not be decoded as JSON.
pub fn score_text_response(raw_text: &str, record: &RecordDescriptor) -> f32 {
    let mut score: f32 = 0.70;
    let lower = raw_text.to_lowercase();

    if raw_text.len() > 200 {
        score += 0.10;
    }
    if lower.contains("medical") || lower.contains("health") {
        score += 0.10;
    }
    if lower.contains("recommend") || lower.contains("suggest") {
        score += 0.10;
    }
    match record.kind() {
        RecordType::LabResults => score += 0.05,
        RecordType::Imaging => score += 0.05,
        _ => {}
    }

    score.clamp(TEXT_CONFIDENCE_MIN, TEXT_CONFIDENCE_MAX)
}
