//! Gemini-backed generator -- posts the compact TOON request to the
//! `generateContent` endpoint and returns the model's raw text.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use toonmap_core::error::GenerationError;
use toonmap_core::generator::{GenerationRequest, Generator, SYSTEM_INSTRUCTION};

pub(crate) const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub(crate) const MODEL_ENV: &str = "TOONMAP_MODEL";
pub(crate) const API_URL_ENV: &str = "TOONMAP_API_URL";

/// Default model for semantic mapping.
pub(crate) const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`GeminiGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GeneratorConfig {
    pub api_key: String,
    pub model: String,
    /// Endpoint base, without a trailing slash.
    pub api_base: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GeneratorConfig {
    /// Config with the given API key and default model.
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            temperature: 0.1,
            top_p: 0.8,
            max_output_tokens: 512,
        }
    }

    pub fn with_model(api_key: String, model: String) -> Self {
        Self {
            model,
            ..Self::new(api_key)
        }
    }

    /// Read the config from the process environment. `None` when no API key
    /// is set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let api_key = non_empty(API_KEY_ENV)?;
        let mut config = match non_empty(MODEL_ENV) {
            Some(model) => Self::with_model(api_key, model),
            None => Self::new(api_key),
        };
        if let Some(base) = non_empty(API_URL_ENV) {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        Some(config)
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

pub(crate) struct GeminiGenerator {
    config: GeneratorConfig,
}

impl GeminiGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let config = self.config.clone();
        let user_message = request.to_toon();

        // ureq is synchronous, so wrap in spawn_blocking
        tokio::task::spawn_blocking(move || call_gemini_api(&config, &user_message))
            .await
            .map_err(|e| GenerationError::Other(format!("task join error: {}", e)))?
    }
}

// ── API call ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: Option<Content>,
}

fn build_request_body(config: &GeneratorConfig, user_message: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: Some(SYSTEM_INSTRUCTION.to_string()),
            }],
        },
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(user_message.to_string()),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: config.temperature,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        },
    }
}

/// Make a synchronous call to the generateContent endpoint.
fn call_gemini_api(config: &GeneratorConfig, user_message: &str) -> Result<String, GenerationError> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(REQUEST_TIMEOUT))
        .build()
        .into();

    let endpoint = config.endpoint();
    tracing::debug!(%endpoint, model = %config.model, "calling generation service");

    let mut response = agent
        .post(endpoint.as_str())
        .header("x-goog-api-key", config.api_key.as_str())
        .header("content-type", "application/json")
        .send_json(build_request_body(config, user_message))
        .map_err(classify_transport_error)?;

    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(classify_transport_error)?;

    if let Some(err) = classify_status(status, &body) {
        return Err(err);
    }
    extract_text(&body)
}

fn classify_transport_error(err: ureq::Error) -> GenerationError {
    let detail = err.to_string();
    match err {
        ureq::Error::StatusCode(429) => GenerationError::Quota(detail),
        ureq::Error::Io(_)
        | ureq::Error::Timeout(_)
        | ureq::Error::HostNotFound
        | ureq::Error::ConnectionFailed => GenerationError::Network(detail),
        _ => GenerationError::Other(detail),
    }
}

/// Map a non-success HTTP response to a generation error class.
fn classify_status(status: u16, body: &str) -> Option<GenerationError> {
    if (200..300).contains(&status) {
        return None;
    }
    let detail = format!("HTTP {}: {}", status, truncate(body.trim(), 200));
    let lower = body.to_lowercase();
    if status == 429 || lower.contains("quota") || lower.contains("rate limit") {
        Some(GenerationError::Quota(detail))
    } else {
        Some(GenerationError::Other(detail))
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(body: &str) -> Result<String, GenerationError> {
    let resp: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        GenerationError::Other(format!("failed to parse generation response: {}", e))
    })?;

    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(GenerationError::Other(
            "generation response contained no text".to_string(),
        ));
    }
    Ok(text.to_string())
}

/// Truncate a string for error messages.
fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
