//! Text-generation provider contract and the OpenAI Responses API client.
//!
//! # Responsibility
//! - Submit instructions + input and return the model's free-form text.
//! - Normalize the several response shapes the API may return into text.
//!
//! # Invariants
//! - No retries: every failure is returned to the caller as-is.
//! - Failure context is bounded (`RAW_CONTEXT_MAX_CHARS`) before surfacing.

use crate::model::article::char_prefix;
use crate::provider::error::GenerationError;
use crate::provider::json_extract::parse_json_from_text;
use log::{error, info};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/responses";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";
pub const AUTH_ENV_VAR: &str = "OPENAI_API_KEY";
const RAW_CONTEXT_MAX_CHARS: usize = 800;

/// One prompt submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest {
    pub instructions: String,
    pub input: String,
}

/// External text-generation collaborator.
pub trait TextProvider: Send + Sync {
    /// Submits one prompt and returns the model's text output.
    fn submit(&self, request: &TextRequest) -> Result<String, GenerationError>;
}

/// Submits `request` and parses the JSON object/array embedded in the reply.
pub fn generate_json<T: DeserializeOwned>(
    provider: &dyn TextProvider,
    request: &TextRequest,
) -> Result<T, GenerationError> {
    let text = provider.submit(request)?;
    parse_json_from_text(&text)
}

/// Connection settings for `OpenAiClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            endpoint: DEFAULT_OPENAI_ENDPOINT.to_string(),
            timeout_secs: 60,
        }
    }
}

/// Blocking HTTP client for the OpenAI Responses API.
pub struct OpenAiClient {
    config: OpenAiConfig,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("model", &self.config.model)
            .field("endpoint", &self.config.endpoint)
            .field("has_api_key", &self.config.api_key.is_some())
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self { config }
    }

    /// Model name as sent on the wire (trimmed, lowercase).
    pub fn model(&self) -> String {
        normalize_model(&self.config.model)
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(GenerationError::MissingCredential(AUTH_ENV_VAR))
    }

    fn build_http_client(&self) -> Result<Client, GenerationError> {
        Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|err| GenerationError::Transport(format!("failed to build client: {err}")))
    }
}

impl TextProvider for OpenAiClient {
    fn submit(&self, request: &TextRequest) -> Result<String, GenerationError> {
        let api_key = self.api_key()?;
        let model = self.model();
        let client = self.build_http_client()?;
        let started_at = Instant::now();

        let payload = json!({
            "model": model,
            "instructions": request.instructions,
            "input": request.input,
        });

        let response = client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .map_err(|err| {
                error!(
                    "event=provider_submit module=provider status=error model={} duration_ms={} error_code=transport",
                    model,
                    started_at.elapsed().as_millis()
                );
                GenerationError::Transport(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = status_body(response.text());
            error!(
                "event=provider_submit module=provider status=error model={} duration_ms={} http_status={}",
                model,
                started_at.elapsed().as_millis(),
                status.as_u16()
            );
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response
            .json()
            .map_err(|err| GenerationError::Transport(format!("invalid response body: {err}")))?;

        info!(
            "event=provider_submit module=provider status=ok model={} duration_ms={}",
            model,
            started_at.elapsed().as_millis()
        );

        extract_text(&data).ok_or_else(|| GenerationError::MissingText {
            raw: char_prefix(&data.to_string(), RAW_CONTEXT_MAX_CHARS).to_string(),
        })
    }
}

/// Body text for a non-2xx reply; a failed read is reported in its place.
fn status_body<E: std::fmt::Display>(read: Result<String, E>) -> String {
    read.unwrap_or_else(|err| format!("(response body unreadable: {err})"))
}

/// Pulls model text out of a Responses API or Chat Completions payload.
///
/// Order: `output_text`, then `output[].content[]` text parts and direct
/// `output[].text`, then `choices[0].message.content`.
pub fn extract_text(data: &Value) -> Option<String> {
    let object = data.as_object()?;

    if let Some(text) = object.get("output_text").and_then(non_blank_str) {
        return Some(text.to_string());
    }

    if let Some(output) = object.get("output").and_then(Value::as_array) {
        let mut texts: Vec<&str> = Vec::new();
        for item in output {
            if let Some(parts) = item.get("content").and_then(Value::as_array) {
                for part in parts {
                    let is_text_part = matches!(
                        part.get("type").and_then(Value::as_str),
                        Some("output_text") | Some("text")
                    );
                    if !is_text_part {
                        continue;
                    }
                    if let Some(text) = part.get("text").and_then(non_blank_str) {
                        texts.push(text);
                    }
                }
            }
            if let Some(text) = item.get("text").and_then(non_blank_str) {
                texts.push(text);
            }
        }

        let joined = texts.join("\n");
        let joined = joined.trim();
        if !joined.is_empty() {
            return Some(joined.to_string());
        }
    }

    object
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(non_blank_str)
        .map(str::to_string)
}

fn non_blank_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|text| !text.trim().is_empty())
}

fn normalize_model(model: &str) -> String {
    model.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{
        extract_text, generate_json, status_body, OpenAiClient, OpenAiConfig, TextProvider,
        TextRequest,
    };
    use crate::provider::error::GenerationError;
    use serde::Deserialize;
    use serde_json::json;

    struct CannedProvider(&'static str);

    impl TextProvider for CannedProvider {
        fn submit(&self, _request: &TextRequest) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Debug, Deserialize)]
    struct Pair {
        a: u32,
    }

    fn request() -> TextRequest {
        TextRequest {
            instructions: "i".to_string(),
            input: "x".to_string(),
        }
    }

    #[test]
    fn status_body_keeps_read_failures() {
        assert_eq!(status_body::<String>(Ok("rate limited".to_string())), "rate limited");
        let body = status_body(Err("connection reset"));
        assert!(body.contains("unreadable"));
        assert!(body.contains("connection reset"));
    }

    #[test]
    fn prefers_output_text_shortcut() {
        let data = json!({ "output_text": "hello", "choices": [] });
        assert_eq!(extract_text(&data).as_deref(), Some("hello"));
    }

    #[test]
    fn joins_responses_output_parts() {
        let data = json!({
            "output": [
                { "type": "message", "content": [
                    { "type": "output_text", "text": "first" },
                    { "type": "refusal", "text": "skip me" },
                    { "type": "text", "text": "second" }
                ]},
                { "text": "third" }
            ]
        });
        assert_eq!(
            extract_text(&data).as_deref(),
            Some("first\nsecond\nthird")
        );
    }

    #[test]
    fn falls_back_to_chat_completions_shape() {
        let data = json!({
            "output": [],
            "choices": [{ "message": { "content": "chat text" } }]
        });
        assert_eq!(extract_text(&data).as_deref(), Some("chat text"));
    }

    #[test]
    fn blank_or_missing_text_yields_none() {
        assert_eq!(extract_text(&json!({ "output_text": "   " })), None);
        assert_eq!(extract_text(&json!([1, 2])), None);
        assert_eq!(extract_text(&json!({ "id": "resp_1" })), None);
    }

    #[test]
    fn generate_json_parses_provider_text() {
        let provider = CannedProvider("Result:\n```json\n{\"a\": 7}\n```");
        let pair: Pair = generate_json(&provider, &request()).expect("json should parse");
        assert_eq!(pair.a, 7);
    }

    #[test]
    fn missing_api_key_fails_before_any_request() {
        let client = OpenAiClient::new(OpenAiConfig::default());
        let err = client.submit(&request()).expect_err("no key configured");
        assert_eq!(err, GenerationError::MissingCredential("OPENAI_API_KEY"));
    }

    #[test]
    fn model_name_is_normalized() {
        let client = OpenAiClient::new(OpenAiConfig {
            model: "  GPT-4.1-Mini ".to_string(),
            ..OpenAiConfig::default()
        });
        assert_eq!(client.model(), "gpt-4.1-mini");
    }
}
