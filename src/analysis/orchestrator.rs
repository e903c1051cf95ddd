//! Provider-chain orchestration: credentials → optional attachment text
//! extraction → primary provider → response parsing, with the local
//! heuristic generator as the unconditional last resort.
//!
//! The public operation is total: every failure mode along the chain is a
//! routing decision, not an error the caller sees.

use super::heuristic::generate_local_analysis;
use super::ocr::extract_attachment_text;
use super::parser::parse_provider_response;
use super::prompt::{build_analysis_prompt, snippet_allowed, ANALYSIS_SYSTEM_PROMPT};
use super::provider::{GroqClient, ProviderClient};
use crate::config;
use crate::models::{AnalysisResult, RecordDescriptor};

/// Analyze one health record with the default chain: the primary provider
/// when a credential is configured, otherwise (or on any failure) the local
/// heuristic generator. Never fails.
pub fn analyze_health_record(record: &RecordDescriptor) -> AnalysisResult {
    AnalysisOrchestrator::from_env().analyze(record)
}

/// Ordered provider fallback. Holds at most one configured provider today;
/// the chain shape allows more without changing the control flow.
pub struct AnalysisOrchestrator {
    providers: Vec<Box<dyn ProviderClient + Send + Sync>>,
    http: reqwest::blocking::Client,
}

impl AnalysisOrchestrator {
    /// Resolve the chain from environment credentials. A missing or
    /// placeholder credential simply leaves the chain empty.
    pub fn from_env() -> Self {
        let mut providers: Vec<Box<dyn ProviderClient + Send + Sync>> = Vec::new();
        match config::groq_api_key() {
            Some(key) => match GroqClient::default_remote(&key) {
                Ok(client) => providers.push(Box::new(client)),
                Err(e) => {
                    tracing::warn!(error = %e, "Primary provider unavailable, chain is local-only");
                }
            },
            None => {
                tracing::debug!("No provider credential configured, chain is local-only");
            }
        }
        Self::with_providers(providers)
    }

    pub fn with_providers(providers: Vec<Box<dyn ProviderClient + Send + Sync>>) -> Self {
        Self {
            providers,
            http: reqwest::blocking::Client::new(),
        }
    }

    /// The chain's single public operation.
    pub fn analyze(&self, record: &RecordDescriptor) -> AnalysisResult {
        let _span = tracing::info_span!("analyze_health_record", record_type = %record.record_type).entered();

        for provider in &self.providers {
            if let Some(result) = self.try_provider(provider.as_ref(), record) {
                return result;
            }
        }

        tracing::info!("Falling back to local heuristic analysis");
        generate_local_analysis(record)
    }

    /// One provider attempt: OCR pre-step (images only, best-effort),
    /// prompt, call, parse. Any failure yields None and the chain moves on.
    fn try_provider(
        &self,
        provider: &dyn ProviderClient,
        record: &RecordDescriptor,
    ) -> Option<AnalysisResult> {
        let extracted = if snippet_allowed(record) {
            extract_attachment_text(&self.http, record)
        } else {
            None
        };

        let prompt = build_analysis_prompt(record, extracted.as_deref());
        match provider.generate(ANALYSIS_SYSTEM_PROMPT, &prompt) {
            Ok(raw) => {
                tracing::debug!(provider = provider.name(), chars = raw.len(), "Provider replied");
                Some(parse_provider_response(&raw, record))
            }
            Err(e) => {
                tracing::warn!(provider = provider.name(), error = %e, "Provider failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::provider::{FailingProviderClient, MockProviderClient};
    use crate::analysis::similarity::similar;
    use crate::models::{GROQ_ANALYSIS_LABEL, LOCAL_ANALYSIS_LABEL, TEXT_ANALYSIS_LABEL};

    fn record(record_type: &str, description: &str) -> RecordDescriptor {
        RecordDescriptor {
            title: "CBC Panel".into(),
            description: description.into(),
            record_type: record_type.into(),
            service_date: "2024-01-01".into(),
            file_url: None,
            file_name: None,
        }
    }

    fn local_only() -> AnalysisOrchestrator {
        AnalysisOrchestrator::with_providers(Vec::new())
    }

    fn with_mock(response: &str) -> AnalysisOrchestrator {
        AnalysisOrchestrator::with_providers(vec![Box::new(MockProviderClient::new(response))])
    }

    #[test]
    fn no_credentials_routes_to_local_heuristic() {
        let result = local_only().analyze(&record("Lab Results", ""));
        assert_eq!(result.analysis_type, LOCAL_ANALYSIS_LABEL);
        assert!(result
            .key_findings
            .contains(&"Record type: Lab Results".to_string()));
        assert!((0.4..=0.95).contains(&result.confidence));
    }

    #[test]
    fn provider_failure_falls_through_to_local_heuristic() {
        let orchestrator =
            AnalysisOrchestrator::with_providers(vec![Box::new(FailingProviderClient)]);
        let result = orchestrator.analyze(&record("Imaging", "Chest X-ray, unremarkable."));
        assert_eq!(result.analysis_type, LOCAL_ANALYSIS_LABEL);
    }

    #[test]
    fn later_provider_used_when_first_fails() {
        let orchestrator = AnalysisOrchestrator::with_providers(vec![
            Box::new(FailingProviderClient),
            Box::new(MockProviderClient::new(
                r#"{"summary": "From the second provider.", "keyFindings": ["One distinct finding"]}"#,
            )),
        ]);
        let result = orchestrator.analyze(&record("Other", "notes"));
        assert_eq!(result.summary, "From the second provider.");
    }

    #[test]
    fn structured_provider_reply_parsed_and_labeled() {
        let raw = r#"{
            "summary": "Lab panel shows mild anemia.",
            "keyFindings": ["Hemoglobin slightly below range"],
            "riskWarnings": ["Untreated anemia can worsen fatigue"],
            "recommendations": ["Repeat CBC in three months"],
            "confidence": 0.88
        }"#;
        let result = with_mock(raw).analyze(&record("Lab Results", "CBC drawn."));
        assert_eq!(result.analysis_type, GROQ_ANALYSIS_LABEL);
        assert_eq!(result.summary, "Lab panel shows mild anemia.");
        assert!((result.confidence - 0.88).abs() < 1e-6);
    }

    #[test]
    fn unstructured_provider_reply_uses_text_fallback() {
        let raw = "Overall the record looks routine.\n\nRecommendations:\n- Stay hydrated";
        let result = with_mock(raw).analyze(&record("Other", "notes"));
        assert_eq!(result.analysis_type, TEXT_ANALYSIS_LABEL);
        assert!(result.recommendations.contains(&"Stay hydrated".to_string()));
    }

    #[test]
    fn analyze_is_total_for_degenerate_inputs() {
        let records = [
            record("", ""),
            record("Lab Results", ""),
            RecordDescriptor {
                title: String::new(),
                description: String::new(),
                record_type: "???".into(),
                service_date: String::new(),
                file_url: None,
                file_name: Some("scan.jpg".into()),
            },
        ];
        for rec in &records {
            let result =
                AnalysisOrchestrator::with_providers(vec![Box::new(FailingProviderClient)])
                    .analyze(rec);
            assert!(!result.summary.is_empty() || !result.key_findings.is_empty());
            assert!((0.0..=1.0).contains(&result.confidence));
        }
    }

    #[test]
    fn every_path_satisfies_list_invariants() {
        let replies = [
            r#"{"summary": "s", "keyFindings": ["a", "a", "a"], "riskWarnings": ["w"], "recommendations": ["r"]}"#,
            "Free text reply without any sections at all",
        ];
        let rec = record("Physical Exam", "Annual exam, blood pressure 124/80.");
        for raw in replies {
            let result = with_mock(raw).analyze(&rec);
            for list in [&result.key_findings, &result.risk_warnings, &result.recommendations] {
                assert!(list.len() <= 5);
                for entry in list {
                    assert!(entry.chars().count() <= 280);
                    assert!(!similar(entry, &result.summary));
                }
            }
        }
    }
}
