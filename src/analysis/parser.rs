//! Provider-response parsing: strict JSON first, keyword-anchored text
//! scanning as the fallback. Both paths run the diversifier and both
//! degrade instead of raising — malformed provider output is routine here.

use serde::Deserialize;

use super::confidence::score_text_response;
use super::normalize::{diversify_sections, MAX_LIST_ENTRIES};
use crate::models::{AnalysisResult, RecordDescriptor, GROQ_ANALYSIS_LABEL, TEXT_ANALYSIS_LABEL};

/// Confidence assigned when a structured payload omits a numeric confidence.
const DEFAULT_STRUCTURED_CONFIDENCE: f32 = 0.85;

/// Anchor keywords for the three extractable sections.
const FINDINGS_KEYWORDS: &[&str] = &["key findings", "findings", "observations"];
const WARNINGS_KEYWORDS: &[&str] = &["risk warnings", "warnings", "risks", "concerns"];
const RECOMMENDATIONS_KEYWORDS: &[&str] = &["recommendations", "recommendation", "advice", "next steps"];

/// Parse a raw provider reply into a normalized [`AnalysisResult`].
/// Total: any decode failure falls back to unstructured text scanning.
pub fn parse_provider_response(raw_text: &str, record: &RecordDescriptor) -> AnalysisResult {
    match parse_structured(raw_text, record) {
        Some(result) => result,
        None => parse_unstructured(raw_text, record),
    }
}

/// Optional fields of a JSON-shaped provider payload.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawAnalysisPayload {
    summary: Option<String>,
    key_findings: Option<serde_json::Value>,
    risk_warnings: Option<serde_json::Value>,
    recommendations: Option<serde_json::Value>,
    confidence: Option<serde_json::Value>,
    analysis_type: Option<String>,
}

/// Strategy 1: strict decode of a (possibly fenced) JSON payload.
fn parse_structured(raw_text: &str, record: &RecordDescriptor) -> Option<AnalysisResult> {
    let stripped = strip_code_fences(raw_text);
    let payload: RawAnalysisPayload = serde_json::from_str(stripped).ok()?;

    let summary = payload
        .summary
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| synthesize_summary(record));

    let mut findings = read_string_list(payload.key_findings.as_ref());
    let mut warnings = read_string_list(payload.risk_warnings.as_ref());
    let mut recommendations = read_string_list(payload.recommendations.as_ref());

    // Generic pre-diversification fill-in, distinct from the record-type
    // defaults the diversifier backfills with.
    if findings.is_empty() {
        findings = fallback_findings(record);
    }
    if warnings.is_empty() {
        warnings = fallback_warnings();
    }
    if recommendations.is_empty() {
        recommendations = fallback_recommendations(record);
    }

    // Provider-trusted when numeric, clamped to [0, 1] only.
    let confidence = payload
        .confidence
        .as_ref()
        .and_then(|v| v.as_f64())
        .map(|c| (c as f32).clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_STRUCTURED_CONFIDENCE);

    let analysis_type = payload
        .analysis_type
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| GROQ_ANALYSIS_LABEL.to_string());

    let sections = diversify_sections(&summary, &findings, &warnings, &recommendations, record);

    Some(AnalysisResult {
        summary: sections.summary,
        key_findings: sections.findings,
        risk_warnings: sections.warnings,
        recommendations: sections.recommendations,
        confidence,
        analysis_type,
    })
}

/// Strategy 2: heuristic section extraction from loosely formatted text.
fn parse_unstructured(raw_text: &str, record: &RecordDescriptor) -> AnalysisResult {
    let summary = raw_text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| synthesize_summary(record));

    let findings = extract_keyword_list(raw_text, FINDINGS_KEYWORDS);
    let warnings = extract_keyword_list(raw_text, WARNINGS_KEYWORDS);
    let recommendations = extract_keyword_list(raw_text, RECOMMENDATIONS_KEYWORDS);

    let confidence = score_text_response(raw_text, record);
    let sections = diversify_sections(&summary, &findings, &warnings, &recommendations, record);

    AnalysisResult {
        summary: sections.summary,
        key_findings: sections.findings,
        risk_warnings: sections.warnings,
        recommendations: sections.recommendations,
        confidence,
        analysis_type: TEXT_ANALYSIS_LABEL.to_string(),
    }
}

/// Scan for the first line containing any anchor keyword, then collect
/// bulleted or numbered lines after it. Stops at a blank line or at what
/// looks like the next section header (a line containing a colon).
pub fn extract_keyword_list(text: &str, keywords: &[&str]) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();

    let anchor = lines.iter().position(|line| {
        let lower = line.to_lowercase();
        keywords.iter().any(|k| lower.contains(k))
    });
    let Some(anchor) = anchor else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for line in &lines[anchor + 1..] {
        if items.len() >= MAX_LIST_ENTRIES {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.contains(':') {
            break;
        }
        if let Some(item) = strip_list_marker(trimmed) {
            items.push(item.to_string());
        }
    }
    items
}

/// Strip a leading bullet (`-`, `•`, `*`) or numbered marker (`3.`).
fn strip_list_marker(line: &str) -> Option<&str> {
    for marker in ["-", "•", "*"] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim_start());
        }
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix('.') {
            return Some(rest.trim_start());
        }
    }
    None
}

/// Strip a leading/trailing triple-backtick fence, optionally tagged `json`.
fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Lenient list reading: non-list or missing becomes empty, non-string
/// items are skipped.
fn read_string_list(value: Option<&serde_json::Value>) -> Vec<String> {
    match value.and_then(|v| v.as_array()) {
        Some(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

/// Synthesized summary for payloads that carry none.
fn synthesize_summary(record: &RecordDescriptor) -> String {
    format!(
        "This {} record titled \"{}\" was created on {}.",
        record.record_type, record.title, record.service_date
    )
}

fn fallback_findings(record: &RecordDescriptor) -> Vec<String> {
    let document = record
        .file_name
        .clone()
        .unwrap_or_else(|| record.title.clone());
    vec![
        format!("{} record dated {}", record.record_type, record.service_date),
        format!("Document on file: {document}"),
    ]
}

fn fallback_warnings() -> Vec<String> {
    vec!["No specific risk indicators were identified in this analysis".to_string()]
}

fn fallback_recommendations(record: &RecordDescriptor) -> Vec<String> {
    vec![
        format!("Review this {} record with your healthcare provider", record.record_type),
        "Keep this document available for future appointments".to_string(),
    ]
}
