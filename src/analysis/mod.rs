pub mod confidence;
pub mod defaults;
pub mod heuristic;
pub mod normalize;
pub mod ocr;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod similarity;

pub use confidence::*;
pub use defaults::*;
pub use heuristic::*;
pub use normalize::*;
pub use ocr::*;
pub use orchestrator::*;
pub use parser::*;
pub use prompt::*;
pub use provider::*;
pub use similarity::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Cannot reach provider at {0}")]
    ProviderConnection(String),

    #[error("Provider returned error (status {status}): {body}")]
    ProviderError { status: u16, body: String },

    #[error("No candidate model responded")]
    NoModelAvailable,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Text extraction error: {0}")]
    Extraction(String),
}
