//! List normalization and cross-section diversification.
//!
//! This is the single point where the output invariant is enforced: at most
//! 5 entries per list, at most 280 characters per entry, no near-duplicate
//! pairs within a list, and no entry near-duplicating the summary.

use super::defaults::defaults_for;
use super::similarity::similar;
use crate::models::RecordDescriptor;

/// Maximum entries kept per output list.
pub const MAX_LIST_ENTRIES: usize = 5;

/// Maximum characters per entry, ellipsis included.
pub const MAX_ENTRY_CHARS: usize = 280;

/// Stable, order-preserving deduplication of a candidate list against a
/// reference text and against already-kept entries (first seen wins).
pub fn normalize_list(items: &[String], reference_text: &str) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();

    for item in items {
        if kept.len() >= MAX_LIST_ENTRIES {
            break;
        }
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        if similar(trimmed, reference_text) {
            continue;
        }
        if kept.iter().any(|existing| similar(trimmed, existing)) {
            continue;
        }
        kept.push(truncate_entry(trimmed));
    }

    kept
}

/// Truncate an over-long entry, marking the cut with an ellipsis.
fn truncate_entry(text: &str) -> String {
    if text.chars().count() <= MAX_ENTRY_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(MAX_ENTRY_CHARS - 3).collect();
    format!("{}...", head.trim_end())
}

/// The four output sections after diversification.
#[derive(Debug, Clone)]
pub struct DiversifiedSections {
    pub summary: String,
    pub findings: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Normalize the three list sections against the summary, backfilling any
/// section that ends up empty from the record-type defaults.
pub fn diversify_sections(
    summary: &str,
    findings: &[String],
    warnings: &[String],
    recommendations: &[String],
    record: &RecordDescriptor,
) -> DiversifiedSections {
    let summary = summary.trim().to_string();

    let mut findings = normalize_list(findings, &summary);
    let mut warnings = normalize_list(warnings, &summary);
    let mut recommendations = normalize_list(recommendations, &summary);

    if findings.is_empty() || warnings.is_empty() || recommendations.is_empty() {
        let defaults = defaults_for(record);
        if findings.is_empty() {
            findings = defaults.findings;
        }
        if warnings.is_empty() {
            warnings = defaults.warnings;
        }
        if recommendations.is_empty() {
            recommendations = defaults.recommendations;
        }
    }

    DiversifiedSections {
        summary,
        findings,
        warnings,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordDescriptor;

    fn record() -> RecordDescriptor {
        RecordDescriptor {
            title: "CBC Panel".into(),
            description: String::new(),
            record_type: "Lab Results".into(),
            service_date: "2024-01-01".into(),
            file_url: None,
            file_name: None,
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn drops_blank_entries() {
        let out = normalize_list(&strings(&["", "  ", "Real finding"]), "summary");
        assert_eq!(out, vec!["Real finding"]);
    }

    #[test]
    fn drops_entries_duplicating_reference() {
        let out = normalize_list(
            &strings(&["Cholesterol is elevated", "Schedule a follow-up"]),
            "Cholesterol is elevated.",
        );
        assert_eq!(out, vec!["Schedule a follow-up"]);
    }

    #[test]
    fn first_seen_wins_on_internal_duplicates() {
        let out = normalize_list(
            &strings(&[
                "Blood pressure reading is elevated",
                "blood pressure reading was elevated!",
                "Glucose within range",
            ]),
            "",
        );
        assert_eq!(
            out,
            vec!["Blood pressure reading is elevated", "Glucose within range"]
        );
    }

    #[test]
    fn caps_list_at_five() {
        let items: Vec<String> = (0..9).map(|i| format!("Distinct entry number {i}")).collect();
        let out = normalize_list(&items, "");
        assert_eq!(out.len(), MAX_LIST_ENTRIES);
        assert_eq!(out[0], "Distinct entry number 0");
    }

    #[test]
    fn truncates_long_entries_with_ellipsis() {
        let long = "x".repeat(400);
        let out = normalize_list(&[long], "");
        assert_eq!(out[0].chars().count(), MAX_ENTRY_CHARS);
        assert!(out[0].ends_with("..."));
    }

    #[test]
    fn normalization_is_idempotent() {
        let items = strings(&[
            "Blood pressure elevated at 150/95",
            "Cholesterol above target range",
            "Blood pressure elevated at 150/95 today",
        ]);
        let once = normalize_list(&items, "Lab panel reviewed");
        let twice = normalize_list(&once, "Lab panel reviewed");
        assert_eq!(once, twice);
    }

    #[test]
    fn diversify_backfills_empty_sections_from_defaults() {
        let sections = diversify_sections("A summary.", &[], &[], &[], &record());
        assert!(!sections.findings.is_empty());
        assert!(!sections.warnings.is_empty());
        assert!(!sections.recommendations.is_empty());
    }

    #[test]
    fn diversify_removes_summary_echoes_then_backfills() {
        // Every warning repeats the summary -> list empties -> backfilled,
        // and the backfill is distinct from the summary.
        let summary = "Total cholesterol is elevated above the reference range";
        let warnings = strings(&[summary, summary, summary]);
        let sections =
            diversify_sections(summary, &strings(&["A finding"]), &warnings, &strings(&["A rec"]), &record());
        assert!(!sections.warnings.is_empty());
        for w in &sections.warnings {
            assert!(!similar(w, summary));
        }
    }

    #[test]
    fn diversify_output_has_no_near_duplicates() {
        let summary = "Routine panel results reviewed";
        let findings = strings(&[
            "Hemoglobin within normal limits",
            "hemoglobin within normal limits",
            "White cell count mildly elevated",
        ]);
        let sections = diversify_sections(summary, &findings, &[], &[], &record());
        for (i, a) in sections.findings.iter().enumerate() {
            assert!(!similar(a, &sections.summary));
            for b in sections.findings.iter().skip(i + 1) {
                assert!(!similar(a, b), "{a:?} duplicates {b:?}");
            }
        }
    }

    #[test]
    fn diversify_trims_summary() {
        let sections = diversify_sections("  padded summary  ", &[], &[], &[], &record());
        assert_eq!(sections.summary, "padded summary");
    }
}
