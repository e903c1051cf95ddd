//! Canned per-record-type section content, used only when normalization
//! leaves a section empty. Pure lookup, no side effects.

use crate::models::{RecordDescriptor, RecordType};

/// Fallback findings/warnings/recommendations for one record type.
#[derive(Debug, Clone)]
pub struct SectionDefaults {
    pub findings: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Defaults keyed on the descriptor's record type. The generic branch
/// echoes the caller's record-type tag and service date verbatim.
pub fn defaults_for(record: &RecordDescriptor) -> SectionDefaults {
    match record.kind() {
        RecordType::Prescription => SectionDefaults {
            findings: vec![
                "Prescription medication documented for your records".into(),
                "Dosage and administration instructions recorded".into(),
            ],
            warnings: vec![
                "Take medication exactly as prescribed".into(),
                "Contact your provider before stopping or changing the dose".into(),
            ],
            recommendations: vec![
                "Keep this prescription record for refill reference".into(),
                "Report unexpected side effects to your pharmacist or provider".into(),
            ],
        },
        RecordType::LabResults => SectionDefaults {
            findings: vec![
                "Laboratory panel results documented".into(),
                "Values should be compared against the listed reference ranges".into(),
            ],
            warnings: vec![
                "Out-of-range values need professional interpretation".into(),
            ],
            recommendations: vec![
                "Review these results with the ordering provider".into(),
                "Keep prior panels available for trend comparison".into(),
            ],
        },
        _ => SectionDefaults {
            findings: vec![
                format!("Record type: {}", record.record_type),
                format!("Documented on {}", record.service_date),
            ],
            warnings: vec![
                "This record has not been clinically reviewed".into(),
            ],
            recommendations: vec![
                "Share this record with your healthcare provider".into(),
                "Keep your health records up to date".into(),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(record_type: &str) -> RecordDescriptor {
        RecordDescriptor {
            title: "Test Record".into(),
            description: String::new(),
            record_type: record_type.into(),
            service_date: "2024-03-10".into(),
            file_url: None,
            file_name: None,
        }
    }

    #[test]
    fn prescription_defaults_are_medication_oriented() {
        let d = defaults_for(&record("prescription"));
        assert!(d.findings.iter().any(|f| f.contains("medication")));
        assert!(d.warnings.iter().any(|w| w.contains("prescribed")));
    }

    #[test]
    fn lab_defaults_match_loose_tags() {
        for tag in ["Lab Results", "lab", "labresult", "lab-result"] {
            let d = defaults_for(&record(tag));
            assert!(
                d.findings.iter().any(|f| f.contains("Laboratory")),
                "tag {tag:?} should hit the lab branch"
            );
        }
    }

    #[test]
    fn generic_defaults_echo_tag_and_date_verbatim() {
        let d = defaults_for(&record("Vaccination"));
        assert!(d.findings.contains(&"Record type: Vaccination".to_string()));
        assert!(d.findings.contains(&"Documented on 2024-03-10".to_string()));
    }

    #[test]
    fn all_branches_populate_every_section() {
        for tag in ["prescription", "Lab Results", "Imaging", "anything"] {
            let d = defaults_for(&record(tag));
            assert!(!d.findings.is_empty());
            assert!(!d.warnings.is_empty());
            assert!(!d.recommendations.is_empty());
        }
    }
}
