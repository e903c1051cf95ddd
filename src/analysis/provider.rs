//! Provider clients: one polymorphic capability — "produce raw analysis
//! text or fail" — behind [`ProviderClient`]. The orchestrator composes
//! these into an ordered fallback chain.

use serde::{Deserialize, Serialize};

use super::AnalysisError;

/// Default model for the primary (Groq) provider.
const GROQ_MODEL: &str = "llama-3.1-8b-instant";

/// Default model for the alternate provider.
const OPENROUTER_MODEL: &str = "meta-llama/llama-3.1-8b-instruct";

/// Candidate models for the secondary inference provider, tried in order.
const HF_FALLBACK_MODELS: &[&str] = &[
    "mistralai/Mistral-7B-Instruct-v0.3",
    "HuggingFaceH4/zephyr-7b-beta",
    "google/flan-t5-large",
];

/// Request timeout for provider calls.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A text-generation provider: produce raw analysis text or fail.
pub trait ProviderClient {
    /// Label recorded as `analysis_type` context and in logs.
    fn name(&self) -> &'static str;

    fn generate(&self, system: &str, prompt: &str) -> Result<String, AnalysisError>;
}

// ── Chat-completion wire shapes ─────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Provider calls carry an explicit timeout rather than relying on the
/// transport's unbounded default: a hung provider degrades to the local
/// heuristic instead of stalling the caller indefinitely.
fn build_http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, AnalysisError> {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AnalysisError::HttpClient(e.to_string()))
}

fn map_transport_error(base_url: &str, timeout_secs: u64, e: reqwest::Error) -> AnalysisError {
    if e.is_connect() {
        AnalysisError::ProviderConnection(base_url.to_string())
    } else if e.is_timeout() {
        AnalysisError::HttpClient(format!("Request timed out after {timeout_secs}s"))
    } else {
        AnalysisError::HttpClient(e.to_string())
    }
}

/// POST a chat-completion request and pull out `choices[0].message.content`.
fn post_chat_completion(
    client: &reqwest::blocking::Client,
    url: &str,
    base_url: &str,
    api_key: &str,
    body: &ChatRequest<'_>,
) -> Result<String, AnalysisError> {
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .map_err(|e| map_transport_error(base_url, DEFAULT_TIMEOUT_SECS, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(AnalysisError::ProviderError {
            status: status.as_u16(),
            body,
        });
    }

    let body = response
        .text()
        .map_err(|e| AnalysisError::HttpClient(e.to_string()))?;
    parse_chat_body(&body)
}

/// Decode a chat-completion body and pull out `choices[0].message.content`.
fn parse_chat_body(body: &str) -> Result<String, AnalysisError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| AnalysisError::JsonParsing(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| AnalysisError::MalformedResponse("Empty choices array".into()))
}

// ── Primary provider ────────────────────────────────────────────────────────

/// Groq chat-completion client: the primary provider on the default chain.
pub struct GroqClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl GroqClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AnalysisError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: GROQ_MODEL.to_string(),
            client: build_http_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }

    /// Production endpoint.
    pub fn default_remote(api_key: &str) -> Result<Self, AnalysisError> {
        Self::new("https://api.groq.com/openai/v1", api_key)
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

impl ProviderClient for GroqClient {
    fn name(&self) -> &'static str {
        "groq"
    }

    fn generate(&self, system: &str, prompt: &str) -> Result<String, AnalysisError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: 0.3,
            max_tokens: 1024,
        };
        post_chat_completion(&self.client, &url, &self.base_url, &self.api_key, &body)
    }
}

// ── Alternate provider (off the default chain) ──────────────────────────────

/// OpenRouter chat-completion client. Callable but not selected by the
/// default chain.
pub struct OpenRouterClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl OpenRouterClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AnalysisError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: OPENROUTER_MODEL.to_string(),
            client: build_http_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }

    pub fn default_remote(api_key: &str) -> Result<Self, AnalysisError> {
        Self::new("https://openrouter.ai/api/v1", api_key)
    }
}

impl ProviderClient for OpenRouterClient {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    fn generate(&self, system: &str, prompt: &str) -> Result<String, AnalysisError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: 0.3,
            max_tokens: 1024,
        };
        post_chat_completion(&self.client, &url, &self.base_url, &self.api_key, &body)
    }
}

// ── Secondary provider (off the default chain) ──────────────────────────────

/// Hugging Face inference client with a data-driven model-fallback loop:
/// candidates are tried in order, first success wins.
pub struct HuggingFaceClient {
    base_url: String,
    api_token: String,
    models: Vec<String>,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct HfRequest<'a> {
    inputs: &'a str,
    parameters: HfParameters,
}

#[derive(Serialize)]
struct HfParameters {
    max_new_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct HfGeneration {
    generated_text: String,
}

impl HuggingFaceClient {
    pub fn new(base_url: &str, api_token: &str) -> Result<Self, AnalysisError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            models: HF_FALLBACK_MODELS.iter().map(|m| m.to_string()).collect(),
            client: build_http_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }

    pub fn default_remote(api_token: &str) -> Result<Self, AnalysisError> {
        Self::new("https://api-inference.huggingface.co/models", api_token)
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    fn generate_with_model(&self, model: &str, inputs: &str) -> Result<String, AnalysisError> {
        let url = format!("{}/{model}", self.base_url);
        let body = HfRequest {
            inputs,
            parameters: HfParameters {
                max_new_tokens: 512,
                temperature: 0.3,
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .map_err(|e| map_transport_error(&self.base_url, DEFAULT_TIMEOUT_SECS, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AnalysisError::ProviderError {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .map_err(|e| AnalysisError::HttpClient(e.to_string()))?;
        parse_hf_body(&body)
    }
}

/// Decode an inference-endpoint body and pull out the first generation.
fn parse_hf_body(body: &str) -> Result<String, AnalysisError> {
    let parsed: Vec<HfGeneration> =
        serde_json::from_str(body).map_err(|e| AnalysisError::JsonParsing(e.to_string()))?;
    parsed
        .into_iter()
        .next()
        .map(|g| g.generated_text)
        .ok_or_else(|| AnalysisError::MalformedResponse("Empty generation array".into()))
}

impl ProviderClient for HuggingFaceClient {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    fn generate(&self, system: &str, prompt: &str) -> Result<String, AnalysisError> {
        let inputs = format!("{system}\n\n{prompt}");
        for model in &self.models {
            match self.generate_with_model(model, &inputs) {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::warn!(model, error = %e, "Candidate model failed, trying next");
                }
            }
        }
        Err(AnalysisError::NoModelAvailable)
    }
}

// ── Test doubles ────────────────────────────────────────────────────────────

/// Mock provider returning a fixed response.
pub struct MockProviderClient {
    response: String,
}

impl MockProviderClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl ProviderClient for MockProviderClient {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn generate(&self, _system: &str, _prompt: &str) -> Result<String, AnalysisError> {
        Ok(self.response.clone())
    }
}

/// Mock provider that always fails, for fallback-path tests.
pub struct FailingProviderClient;

impl ProviderClient for FailingProviderClient {
    fn name(&self) -> &'static str {
        "failing-mock"
    }

    fn generate(&self, _system: &str, _prompt: &str) -> Result<String, AnalysisError> {
        Err(AnalysisError::ProviderError {
            status: 503,
            body: "simulated outage".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_client_returns_configured_response() {
        let client = MockProviderClient::new("analysis text");
        assert_eq!(client.generate("s", "p").unwrap(), "analysis text");
    }

    #[test]
    fn failing_client_reports_provider_error() {
        let result = FailingProviderClient.generate("s", "p");
        assert!(matches!(
            result,
            Err(AnalysisError::ProviderError { status: 503, .. })
        ));
    }

    #[test]
    fn groq_client_trims_trailing_slash() {
        let client = GroqClient::new("https://api.groq.com/openai/v1/", "key").unwrap();
        assert_eq!(client.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(client.model, GROQ_MODEL);
    }

    #[test]
    fn groq_model_override() {
        let client = GroqClient::new("https://api.groq.com/openai/v1", "key")
            .unwrap()
            .with_model("llama-3.3-70b-versatile");
        assert_eq!(client.model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn hf_fallback_list_is_ordered_and_overridable() {
        let client = HuggingFaceClient::new("https://api-inference.huggingface.co/models", "tok")
            .unwrap();
        assert_eq!(client.models.len(), HF_FALLBACK_MODELS.len());
        assert_eq!(client.models[0], HF_FALLBACK_MODELS[0]);

        let client = client.with_models(vec!["custom/model".into()]);
        assert_eq!(client.models, vec!["custom/model".to_string()]);
    }

    #[test]
    fn chat_request_serializes_expected_shape() {
        let body = ChatRequest {
            model: "m",
            messages: vec![
                ChatMessage { role: "system", content: "s" },
                ChatMessage { role: "user", content: "u" },
            ],
            temperature: 0.3,
            max_tokens: 1024,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "u");
        assert_eq!(json["max_tokens"], 1024);
    }

    #[test]
    fn chat_response_deserializes_nested_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello");
    }

    #[test]
    fn chat_body_extracts_first_choice() {
        let raw = r#"{"choices":[{"message":{"content":"first"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(parse_chat_body(raw).unwrap(), "first");
    }

    #[test]
    fn malformed_chat_body_is_a_json_error() {
        let result = parse_chat_body("not json at all");
        assert!(matches!(result, Err(AnalysisError::JsonParsing(_))));
    }

    #[test]
    fn empty_choices_is_a_malformed_response() {
        let result = parse_chat_body(r#"{"choices":[]}"#);
        assert!(matches!(result, Err(AnalysisError::MalformedResponse(_))));
    }

    #[test]
    fn hf_body_extracts_first_generation() {
        let raw = r#"[{"generated_text":"analysis"},{"generated_text":"ignored"}]"#;
        assert_eq!(parse_hf_body(raw).unwrap(), "analysis");
    }

    #[test]
    fn malformed_hf_body_is_a_json_error() {
        let result = parse_hf_body(r#"{"error":"loading"}"#);
        assert!(matches!(result, Err(AnalysisError::JsonParsing(_))));
    }

    #[test]
    fn empty_hf_generations_is_a_malformed_response() {
        let result = parse_hf_body("[]");
        assert!(matches!(result, Err(AnalysisError::MalformedResponse(_))));
    }
}
