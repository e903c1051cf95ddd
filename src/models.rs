use serde::{Deserialize, Serialize};

/// Analysis-type label for results produced by the primary provider.
pub const GROQ_ANALYSIS_LABEL: &str = "Groq AI Analysis";

/// Analysis-type label for results recovered from unstructured provider text.
pub const TEXT_ANALYSIS_LABEL: &str = "AI Text Analysis";

/// Analysis-type label for results produced without any provider.
pub const LOCAL_ANALYSIS_LABEL: &str = "Local Heuristic Analysis";

/// One medical document awaiting analysis, as described by the caller.
/// Consumed read-only; the raw `record_type` tag is kept verbatim for
/// display while dispatch goes through [`RecordType::from_tag`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDescriptor {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub record_type: String,
    pub service_date: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl RecordDescriptor {
    /// Normalized record type for dispatch.
    pub fn kind(&self) -> RecordType {
        RecordType::from_tag(&self.record_type)
    }
}

/// Closed record-type enumeration. The surrounding app tags records with
/// free-form strings in inconsistent casing ("Lab Results", "lab",
/// "lab-result"); all normalization happens here, once, at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Prescription,
    LabResults,
    Imaging,
    PhysicalExam,
    Other,
}

impl RecordType {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_lowercase().trim() {
            "prescription" | "prescriptions" => Self::Prescription,
            "lab results" | "lab result" | "lab-result" | "labresult" | "lab" => Self::LabResults,
            "imaging" | "radiology" | "x-ray" | "xray" | "mri" | "ct scan" => Self::Imaging,
            "physical exam" | "physical" | "exam" | "checkup" => Self::PhysicalExam,
            _ => Self::Other,
        }
    }
}

/// Structured narrative analysis attached to a record. Constructed fresh per
/// request, never mutated after return; the caller serializes it verbatim.
///
/// Invariants (enforced by the diversifier): each list holds at most 5
/// entries of at most 280 characters, no two entries within a list are
/// near-duplicates, and no entry near-duplicates the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub key_findings: Vec<String>,
    pub risk_warnings: Vec<String>,
    pub recommendations: Vec<String>,
    pub confidence: f32,
    pub analysis_type: String,
}
