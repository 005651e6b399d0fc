/// The single point of entry for all chat completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion endpoint directly.
/// The extraction orchestrator only sees the `ModelClient` trait, which keeps the
/// escalation policy testable without a network.
///
/// The client performs exactly one HTTP request per `complete` call. Retries and
/// model escalation belong to the orchestrator.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
pub mod testing;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_ESCALATION_MODEL: &str = "gpt-4";

/// Error code the completion API attaches to oversized prompts.
const CONTEXT_LENGTH_CODE: &str = "context_length_exceeded";
const CONTEXT_LENGTH_MESSAGE: &str = "maximum context length";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Context length exceeded for model {model}: {message}")]
    ContextLengthExceeded { model: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("API key contains characters not allowed in an HTTP header")]
    InvalidApiKey,
}

/// Coarse classification the orchestrator branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    ContextLengthExceeded,
    OtherApiError,
}

impl LlmError {
    pub fn kind(&self) -> RejectionKind {
        match self {
            LlmError::ContextLengthExceeded { .. } => RejectionKind::ContextLengthExceeded,
            _ => RejectionKind::OtherApiError,
        }
    }
}

/// Capacity tier of the model a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVariant {
    /// Fast, cheap model tried first for every document.
    Standard,
    /// Larger-context model used after a context-length rejection.
    Extended,
}

impl ModelVariant {
    /// The next tier up, if any. `Extended` is the top tier.
    pub fn escalate(self) -> Option<ModelVariant> {
        match self {
            ModelVariant::Standard => Some(ModelVariant::Extended),
            ModelVariant::Extended => None,
        }
    }
}

/// Concrete model names behind each variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLineup {
    pub standard: String,
    pub extended: String,
}

impl ModelLineup {
    pub fn model_for(&self, variant: ModelVariant) -> &str {
        match variant {
            ModelVariant::Standard => &self.standard,
            ModelVariant::Extended => &self.extended,
        }
    }
}

impl Default for ModelLineup {
    fn default() -> Self {
        Self {
            standard: DEFAULT_MODEL.to_string(),
            extended: DEFAULT_ESCALATION_MODEL.to_string(),
        }
    }
}

/// One attempt at extracting a document. Built fresh for every call.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    pub instruction: &'a str,
    pub document_content: &'a str,
    pub variant: ModelVariant,
    pub temperature: f32,
}

/// Anything that can answer an extraction request.
///
/// `Ok(None)` means the call succeeded but the response carried no usable
/// message (no choices).
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: &ExtractionRequest<'_>) -> Result<Option<String>, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    code: Option<String>,
}

/// Chat completions client for OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    models: ModelLineup,
}

impl OpenAiClient {
    pub fn new(
        api_key: &str,
        base_url: &str,
        models: ModelLineup,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| LlmError::InvalidApiKey)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            models,
        })
    }

    pub fn models(&self) -> &ModelLineup {
        &self.models
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(&self, request: &ExtractionRequest<'_>) -> Result<Option<String>, LlmError> {
        let model = self.models.model_for(request.variant);
        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.instruction,
                },
                ChatMessage {
                    role: "user",
                    content: request.document_content,
                },
            ],
            temperature: request.temperature,
        };

        debug!(
            "Sending chat completion: model={}, document_chars={}",
            model,
            request.document_content.len()
        );

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_rejection(status, model, body));
        }

        let parsed: ChatResponse = response.json().await?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Chat completion succeeded: model={}, prompt_tokens={}, completion_tokens={}",
                model, usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

/// Maps a non-success response to a typed rejection.
///
/// Only a 400 that the API marks as a context overflow counts as
/// `ContextLengthExceeded`; everything else is an ordinary API error.
fn classify_rejection(status: StatusCode, model: &str, body: String) -> LlmError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(&body).ok();

    if status == StatusCode::BAD_REQUEST {
        if let Some(envelope) = &parsed {
            let by_code = envelope.error.code.as_deref() == Some(CONTEXT_LENGTH_CODE);
            let by_message = envelope.error.message.contains(CONTEXT_LENGTH_MESSAGE);
            if by_code || by_message {
                return LlmError::ContextLengthExceeded {
                    model: model.to_string(),
                    message: envelope.error.message.clone(),
                };
            }
        }
    }

    LlmError::Api {
        status: status.as_u16(),
        message: parsed.map(|e| e.error.message).unwrap_or(body),
    }
}
