use crate::models::{RecordDescriptor, RecordType};

use super::ocr::{classify_attachment, AttachmentKind};

pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"
You are a health-records assistant that writes patient-friendly narrative
analyses of medical documents. You are not a diagnostic tool.

RULES:
1. Base the analysis ONLY on the record details and document text provided.
2. Plain language; no diagnosis, no treatment decisions.
3. Respond with a single JSON object and nothing else, using this shape:
{
  "summary": "one or two sentences",
  "keyFindings": ["up to 5 short items"],
  "riskWarnings": ["up to 5 short items"],
  "recommendations": ["up to 5 short items"],
  "confidence": 0.0
}
"#;

/// Extracted-text snippets are truncated to this many characters.
const MAX_SNIPPET_CHARS: usize = 2000;

/// Build the user prompt for one record, embedding extracted document text
/// when available.
pub fn build_analysis_prompt(record: &RecordDescriptor, extracted_text: Option<&str>) -> String {
    let mut prompt = format!(
        "{framing}\n\nRecord details:\n- Title: {title}\n- Type: {record_type}\n- Service date: {date}\n",
        framing = prompt_framing(record),
        title = record.title,
        record_type = record.record_type,
        date = record.service_date,
    );

    if !record.description.trim().is_empty() {
        prompt.push_str(&format!("- Description: {}\n", record.description.trim()));
    }
    if let Some(file_name) = record.file_name.as_deref() {
        prompt.push_str(&format!("- Attached file: {file_name}\n"));
    }
    if let Some(text) = extracted_text {
        prompt.push_str(&format!(
            "\nText extracted from the attached document:\n{}\n",
            truncate_snippet(text)
        ));
    }

    prompt.push_str("\nRespond with the JSON object only.");
    prompt
}

/// Record-type-specific framing, chosen by attachment kind for
/// prescriptions and by the normalized type otherwise.
fn prompt_framing(record: &RecordDescriptor) -> &'static str {
    match record.kind() {
        RecordType::Prescription => {
            let has_attachment = record
                .file_name
                .as_deref()
                .and_then(classify_attachment)
                .is_some();
            if has_attachment {
                "Analyze this prescription record. The attached document is the written \
                 prescription; focus on medication name, dosage, and administration guidance."
            } else {
                "Analyze this prescription record described in text only; focus on medication \
                 purpose and safe-use guidance."
            }
        }
        RecordType::LabResults => {
            "Analyze this laboratory results record; highlight values outside reference ranges \
             and what the patient should ask the ordering provider."
        }
        RecordType::Imaging => {
            "Analyze this imaging record; summarize why the study was done and what follow-up \
             is typical, without interpreting the images."
        }
        _ => {
            "Analyze this health record and summarize it for the patient in plain language."
        }
    }
}

/// PDFs are framed as attachments but never extracted; only images carry
/// a snippet.
pub fn snippet_allowed(record: &RecordDescriptor) -> bool {
    matches!(
        record.file_name.as_deref().and_then(classify_attachment),
        Some(AttachmentKind::Image)
    )
}

fn truncate_snippet(text: &str) -> String {
    if text.chars().count() <= MAX_SNIPPET_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(MAX_SNIPPET_CHARS).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(record_type: &str, file_name: Option<&str>) -> RecordDescriptor {
        RecordDescriptor {
            title: "Metformin Rx".into(),
            description: "500mg twice daily".into(),
            record_type: record_type.into(),
            service_date: "2024-02-02".into(),
            file_url: None,
            file_name: file_name.map(str::to_string),
        }
    }

    #[test]
    fn prompt_contains_record_details() {
        let prompt = build_analysis_prompt(&record("prescription", None), None);
        assert!(prompt.contains("Metformin Rx"));
        assert!(prompt.contains("2024-02-02"));
        assert!(prompt.contains("500mg twice daily"));
    }

    #[test]
    fn prescription_framing_splits_on_attachment() {
        let with_file = build_analysis_prompt(&record("prescription", Some("rx.jpg")), None);
        assert!(with_file.contains("attached document is the written"));

        let without = build_analysis_prompt(&record("prescription", None), None);
        assert!(without.contains("text only"));
    }

    #[test]
    fn extracted_text_embedded_and_truncated() {
        let long_text = "lab ".repeat(1000);
        let prompt = build_analysis_prompt(&record("Lab Results", Some("scan.png")), Some(&long_text));
        assert!(prompt.contains("Text extracted"));
        let snippet = truncate_snippet(&long_text);
        assert_eq!(snippet.chars().count(), MAX_SNIPPET_CHARS + 3);
        assert!(snippet.ends_with("..."));
        assert!(prompt.contains(&snippet));
    }

    #[test]
    fn short_snippet_not_truncated() {
        assert_eq!(truncate_snippet("short text"), "short text");
    }

    #[test]
    fn snippet_allowed_only_for_images() {
        assert!(snippet_allowed(&record("Imaging", Some("scan.jpeg"))));
        assert!(!snippet_allowed(&record("Imaging", Some("report.pdf"))));
        assert!(!snippet_allowed(&record("Imaging", None)));
    }

    #[test]
    fn system_prompt_demands_json_only() {
        assert!(ANALYSIS_SYSTEM_PROMPT.contains("single JSON object"));
        assert!(ANALYSIS_SYSTEM_PROMPT.contains("keyFindings"));
    }
}
