//! Carelog analysis engine.
//!
//! Takes a record descriptor (title, description, record-type tag, service
//! date, optional attachment) and returns a structured narrative analysis:
//! summary, key findings, risk warnings, recommendations, and a calibrated
//! confidence score. Provider output is normalized and de-duplicated; when
//! no provider is configured or every provider fails, a local heuristic
//! generator produces the result instead. The entry point never fails.

pub mod analysis;
pub mod config;
pub mod models;

pub use analysis::orchestrator::{analyze_health_record, AnalysisOrchestrator};
pub use models::{AnalysisResult, RecordDescriptor, RecordType};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries and integration harnesses embedding
/// this crate. Library callers that already install a subscriber should
/// skip this.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
