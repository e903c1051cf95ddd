//! Local heuristic analysis: the last link of the provider chain.
//!
//! Produces a full structured result purely from pattern-matching the
//! record description against a fixed clinical-phrase vocabulary. It cannot
//! fail, and each branch writes distinct content per section, so the
//! diversifier is not run on this path.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

use super::normalize::MAX_LIST_ENTRIES;
use super::ocr::has_recognized_attachment;
use crate::models::{AnalysisResult, RecordDescriptor, RecordType, LOCAL_ANALYSIS_LABEL};

/// Bounds for locally generated confidence.
pub const LOCAL_CONFIDENCE_MIN: f32 = 0.40;
pub const LOCAL_CONFIDENCE_MAX: f32 = 0.95;

/// Uniform jitter half-width applied to the final confidence.
const CONFIDENCE_JITTER: f32 = 0.05;

fn bp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{2,3})\s*/\s*(\d{2,3})\b").unwrap())
}

fn age_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,3})[\s-]*years?[\s-]*old\b").unwrap())
}

fn normal_value_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Word boundary keeps "abnormal" from matching as "normal".
    RE.get_or_init(|| Regex::new(r"(?i)\bnormal\b|\bunremarkable\b").unwrap())
}

/// Boolean clinical-phrase matches over a record description.
#[derive(Debug, Clone, Default)]
pub struct ClinicalSignals {
    /// First systolic/diastolic reading found, if any.
    pub blood_pressure: Option<(u32, u32)>,
    pub high_blood_pressure: bool,
    pub cholesterol: bool,
    pub chest_pain: bool,
    pub shortness_of_breath: bool,
    pub diabetes: bool,
    pub cardiac_disease: bool,
    pub family_history: bool,
    pub age: Option<u32>,
    pub smoker: bool,
    pub non_smoker: bool,
    pub normal_values: bool,
    pub abnormal_values: bool,
    pub exercise: bool,
    pub medication: bool,
}

/// Run the signal battery over a description.
pub fn detect_signals(description: &str) -> ClinicalSignals {
    let lower = description.to_lowercase();
    let contains_any = |terms: &[&str]| terms.iter().any(|t| lower.contains(t));

    let blood_pressure = bp_regex().captures(description).and_then(|c| {
        let sys: u32 = c[1].parse().ok()?;
        let dia: u32 = c[2].parse().ok()?;
        // Plausibility window; dates like 12/2024 fall outside it.
        if (70..=260).contains(&sys) && (40..=160).contains(&dia) {
            Some((sys, dia))
        } else {
            None
        }
    });

    let non_smoker = contains_any(&["non-smoker", "nonsmoker", "never smoked", "does not smoke", "doesn't smoke", "quit smoking"]);
    let smoker = !non_smoker && contains_any(&["smoker", "smokes", "smoking"]);

    ClinicalSignals {
        blood_pressure,
        high_blood_pressure: contains_any(&["high blood pressure", "hypertension", "elevated bp"])
            || blood_pressure.is_some_and(|(sys, dia)| sys >= 130 || dia >= 85),
        cholesterol: contains_any(&["cholesterol", "lipid", "ldl", "hdl", "triglyceride"]),
        chest_pain: contains_any(&["chest pain", "chest tightness", "angina"]),
        shortness_of_breath: contains_any(&["shortness of breath", "short of breath", "breathless", "dyspnea"]),
        diabetes: contains_any(&["diabetes", "diabetic", "a1c", "hba1c", "blood sugar", "glucose"]),
        cardiac_disease: contains_any(&["heart disease", "cardiac", "heart attack", "myocardial", "arrhythmia"]),
        family_history: contains_any(&["family history", "runs in the family", "hereditary"]),
        age: age_regex()
            .captures(description)
            .and_then(|c| c[1].parse().ok()),
        smoker,
        non_smoker,
        normal_values: normal_value_regex().is_match(description),
        abnormal_values: contains_any(&["abnormal", "elevated", "out of range", "outside the reference", "flagged"]),
        exercise: contains_any(&["exercise", "active lifestyle", "works out", "physically active"]),
        medication: contains_any(&["medication", "prescribed", "taking", " mg", "dose"]),
    }
}

/// Grade a blood-pressure reading into standard categories.
fn bp_category(sys: u32, dia: u32) -> Option<&'static str> {
    if sys >= 140 || dia >= 90 {
        Some("Stage 2 Hypertension")
    } else if sys >= 130 || dia >= 85 {
        Some("Stage 1 Hypertension")
    } else if sys >= 120 {
        Some("Elevated blood pressure")
    } else {
        None
    }
}

/// Working sections while a result is being assembled.
struct Sections {
    summary: String,
    findings: Vec<String>,
    warnings: Vec<String>,
    recommendations: Vec<String>,
}

impl Sections {
    fn new(summary: String) -> Self {
        Self {
            summary,
            findings: Vec::new(),
            warnings: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

/// Generate a full local analysis. Entry point for the default chain;
/// jitter is seeded from the thread RNG.
pub fn generate_local_analysis(record: &RecordDescriptor) -> AnalysisResult {
    let mut rng = StdRng::from_rng(rand::thread_rng()).unwrap_or_else(|_| StdRng::seed_from_u64(0));
    generate_local_analysis_with_rng(record, &mut rng)
}

/// Deterministic variant: the caller supplies the jitter RNG.
pub fn generate_local_analysis_with_rng(
    record: &RecordDescriptor,
    rng: &mut impl Rng,
) -> AnalysisResult {
    let description = record.description.trim();
    let signals = detect_signals(description);

    let mut sections = match record.kind() {
        RecordType::LabResults => lab_results_sections(record, &signals),
        RecordType::Imaging => imaging_sections(record, &signals),
        RecordType::PhysicalExam => physical_exam_sections(record, &signals),
        RecordType::Prescription => prescription_sections(record, &signals),
        RecordType::Other => generic_sections(record, &signals),
    };

    if description.is_empty() {
        overwrite_for_empty_description(record, &mut sections);
    } else {
        apply_age_pass(&signals, &mut sections);
        apply_history_pass(&signals, &mut sections);
    }

    sections.findings.truncate(MAX_LIST_ENTRIES);
    sections.warnings.truncate(MAX_LIST_ENTRIES);
    sections.recommendations.truncate(MAX_LIST_ENTRIES);

    let confidence = compute_local_confidence(
        description,
        &signals,
        sections.findings.len(),
        sections.recommendations.len(),
    );
    let jittered = (confidence + rng.gen_range(-CONFIDENCE_JITTER..=CONFIDENCE_JITTER))
        .clamp(LOCAL_CONFIDENCE_MIN, LOCAL_CONFIDENCE_MAX);

    AnalysisResult {
        summary: sections.summary,
        key_findings: sections.findings,
        risk_warnings: sections.warnings,
        recommendations: sections.recommendations,
        confidence: jittered,
        analysis_type: LOCAL_ANALYSIS_LABEL.to_string(),
    }
}

// ── Record-type branches ────────────────────────────────────────────────────

fn lab_results_sections(record: &RecordDescriptor, signals: &ClinicalSignals) -> Sections {
    let mut s = Sections::new(format!(
        "Laboratory results \"{}\" from {} were screened against common clinical markers.",
        record.title, record.service_date
    ));
    s.findings.push("Laboratory values screened from the record description".into());
    s.warnings.push("Automated screening is not a substitute for clinical review".into());
    s.recommendations.push("Review the full panel with the ordering provider".into());

    if let Some((sys, dia)) = signals.blood_pressure {
        if let Some(category) = bp_category(sys, dia) {
            s.findings.push(format!("Blood pressure {sys}/{dia} — {category}"));
            s.warnings.push("Blood pressure readings above target range require follow-up".into());
            s.recommendations.push("Discuss blood pressure management with your provider".into());
        } else {
            s.findings.push(format!("Blood pressure {sys}/{dia} recorded, within normal range"));
        }
    }
    if signals.cholesterol {
        s.findings.push("Cholesterol or lipid values are referenced in the report".into());
        s.warnings.push("Elevated lipids are a modifiable cardiovascular risk factor".into());
        s.recommendations.push("Consider a repeat fasting lipid panel to confirm trends".into());
    }
    if signals.diabetes {
        s.findings.push("Glucose or HbA1c related values are mentioned".into());
        s.recommendations.push("Track fasting glucose trends between panels".into());
    }
    if signals.abnormal_values {
        s.warnings.push("The report language flags values outside reference ranges".into());
    }
    if signals.normal_values {
        s.findings.push("Several values are described as within normal limits".into());
    }
    s
}

fn imaging_sections(record: &RecordDescriptor, signals: &ClinicalSignals) -> Sections {
    let mut s = Sections::new(format!(
        "Imaging study \"{}\" from {} — the description was screened for reported symptoms and findings.",
        record.title, record.service_date
    ));
    s.findings.push("Imaging study documented for this record".into());
    s.warnings.push("Imaging interpretation requires a radiologist's formal report".into());
    s.recommendations.push("Confirm the formal radiology report is attached to this record".into());

    if signals.chest_pain {
        s.findings.push("Chest pain is mentioned in the clinical context".into());
        s.warnings.push("Chest pain alongside imaging follow-up should be assessed promptly".into());
        s.recommendations.push("Seek urgent care if chest pain recurs or worsens".into());
    }
    if signals.shortness_of_breath {
        s.findings.push("Shortness of breath is noted in the description".into());
        s.warnings.push("Breathing difficulty deserves clinical correlation with the images".into());
    }
    if signals.cardiac_disease {
        s.findings.push("A cardiac history is referenced".into());
        s.recommendations.push("Share prior cardiac imaging with the interpreting radiologist".into());
    }
    if signals.abnormal_values {
        s.warnings.push("The description references abnormal findings".into());
    }
    if signals.normal_values {
        s.findings.push("The study is described as normal or unremarkable".into());
    }
    s
}

fn physical_exam_sections(record: &RecordDescriptor, signals: &ClinicalSignals) -> Sections {
    let mut s = Sections::new(format!(
        "Physical exam \"{}\" on {}: the description was screened for vitals and lifestyle factors.",
        record.title, record.service_date
    ));
    s.findings.push("Physical examination documented".into());
    s.warnings.push("This summary reflects only what the exam description states".into());
    s.recommendations.push("Schedule your next routine exam as advised by your provider".into());

    if let Some((sys, dia)) = signals.blood_pressure {
        match bp_category(sys, dia) {
            Some(category) => {
                s.findings.push(format!("Blood pressure {sys}/{dia} — {category}"));
                s.warnings.push("Repeated elevated readings warrant a dedicated follow-up".into());
                s.recommendations.push("Monitor blood pressure at home and log the readings".into());
            }
            None => s.findings.push(format!("Blood pressure {sys}/{dia}, within normal range")),
        }
    }
    if signals.exercise {
        s.findings.push("Regular physical activity noted — a protective factor".into());
    }
    if signals.medication {
        s.findings.push("Current medications are referenced in the exam notes".into());
        s.recommendations.push("Bring an up-to-date medication list to each visit".into());
    }
    if signals.normal_values {
        s.findings.push("Exam findings are described as normal".into());
    }
    s
}

fn prescription_sections(record: &RecordDescriptor, signals: &ClinicalSignals) -> Sections {
    let mut s = if has_recognized_attachment(record) {
        let document = record.file_name.as_deref().unwrap_or("attachment");
        let mut s = Sections::new(format!(
            "Prescription \"{}\" recorded on {} with an attached document ({document}).",
            record.title, record.service_date
        ));
        s.findings.push("Prescription document attached for reference".into());
        s.findings.push("Recorded details should match the written prescription".into());
        s.warnings.push("Verify dosage instructions against the attached document".into());
        s.recommendations.push("Fill the prescription promptly and follow the label directions".into());
        s
    } else {
        let mut s = Sections::new(format!(
            "Prescription \"{}\" recorded on {} from the written description.",
            record.title, record.service_date
        ));
        s.findings.push("Prescription recorded without an attached document".into());
        s.warnings.push("Ensure dosage instructions are captured accurately".into());
        s.recommendations.push("Attach a photo of the prescription for completeness".into());
        s
    };

    if signals.medication {
        s.findings.push("Medication terms identified in the description".into());
        s.recommendations.push("Maintain an up-to-date medication list across providers".into());
    }
    if signals.diabetes {
        s.findings.push("The medication context references glycemic management".into());
    }
    s
}

fn generic_sections(record: &RecordDescriptor, signals: &ClinicalSignals) -> Sections {
    let mut s = Sections::new(format!(
        "This {} record titled \"{}\" from {} was analyzed locally.",
        record.record_type, record.title, record.service_date
    ));
    s.findings.push(format!("Record type: {}", record.record_type));
    s.warnings.push("Automated local analysis only — not a clinical review".into());
    s.recommendations.push("Discuss this record with your healthcare provider".into());

    if let Some((sys, dia)) = signals.blood_pressure {
        if let Some(category) = bp_category(sys, dia) {
            s.findings.push(format!("Blood pressure {sys}/{dia} — {category}"));
            s.warnings.push("Blood pressure above target range requires follow-up".into());
        }
    }
    if signals.cholesterol {
        s.findings.push("Cholesterol or lipid concerns are mentioned".into());
        s.recommendations.push("Ask about lipid panel screening".into());
    }
    if signals.chest_pain {
        s.warnings.push("Chest pain is reported — do not ignore recurring episodes".into());
        s.recommendations.push("Seek prompt evaluation for any chest pain".into());
    }
    if signals.shortness_of_breath {
        s.warnings.push("Shortness of breath is reported".into());
    }
    if signals.diabetes {
        s.findings.push("Diabetes-related terms are present".into());
    }
    if signals.cardiac_disease {
        s.warnings.push("A cardiac condition is referenced".into());
    }
    s
}

// ── Unconditional post-passes ───────────────────────────────────────────────

/// Age-driven screening recommendations, applied for every record type.
fn apply_age_pass(signals: &ClinicalSignals, sections: &mut Sections) {
    let Some(age) = signals.age else { return };
    if age >= 50 {
        sections.recommendations.push("Age-appropriate cancer screening is recommended".into());
        sections.recommendations.push("Consider a bone density evaluation".into());
    }
    if age >= 65 {
        sections.recommendations.push("Periodic cognitive health assessment is advisable".into());
        sections.recommendations.push("Review fall-risk factors at home".into());
    }
}

/// Family-history and smoking-status pass, applied for every record type.
fn apply_history_pass(signals: &ClinicalSignals, sections: &mut Sections) {
    if signals.family_history {
        sections.warnings.push("Family history of disease raises baseline risk".into());
        sections.recommendations.push("Mention your family history at your next visit".into());
    }
    if signals.non_smoker {
        sections.findings.push("Non-smoking status is a positive health factor".into());
    } else if signals.smoker {
        sections.warnings.push("Smoking significantly increases cardiovascular and cancer risk".into());
        sections.recommendations.push("Consider a smoking cessation program".into());
    }
}

/// Wholesale replacement when no clinical text was available. Signal
/// detection is bypassed entirely.
fn overwrite_for_empty_description(record: &RecordDescriptor, sections: &mut Sections) {
    if record.kind() == RecordType::Prescription {
        sections.findings = vec![
            "Prescription record on file".into(),
            format!("Service date: {}", record.service_date),
        ];
        sections.warnings = vec!["No medication details were provided".into()];
        sections.recommendations = vec![
            "Add the medication name and dosage to this record".into(),
            "Consult your pharmacist with any questions".into(),
        ];
    } else {
        sections.findings = vec![
            format!("Record type: {}", record.record_type),
            format!("Service date: {}", record.service_date),
            "No description was provided for detailed analysis".into(),
        ];
        sections.warnings = vec!["Limited information is available for this record".into()];
        sections.recommendations = vec![
            "Add a description to enable a more detailed analysis".into(),
            "Share this record with your healthcare provider".into(),
        ];
    }
}

// ── Confidence ──────────────────────────────────────────────────────────────

/// Final confidence, recomputed independently of anything a branch did.
pub(crate) fn compute_local_confidence(
    description: &str,
    signals: &ClinicalSignals,
    findings_count: usize,
    recommendations_count: usize,
) -> f32 {
    let mut score: f32 = 0.60;
    let len = description.len();

    if len > 100 {
        score += 0.10;
    }
    if len > 200 {
        score += 0.10;
    }
    if findings_count > 2 {
        score += 0.10;
    }
    if recommendations_count > 2 {
        score += 0.10;
    }
    let hard_signal = signals.high_blood_pressure || signals.cholesterol || signals.chest_pain;
    if hard_signal {
        score += 0.15;
    }
    if signals.age.is_some() {
        score += 0.05;
    }
    if signals.family_history {
        score += 0.10;
    }
    if signals.medication {
        score += 0.05;
    }
    if len < 50 {
        score -= 0.20;
    }
    if !hard_signal && !signals.diabetes {
        score -= 0.10;
    }

    score.clamp(LOCAL_CONFIDENCE_MIN, LOCAL_CONFIDENCE_MAX)
}
