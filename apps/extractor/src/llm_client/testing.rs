//! In-memory `ModelClient` double that replays a fixed script of outcomes.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ExtractionRequest, LlmError, ModelClient, ModelVariant};

pub type ScriptedReply = Result<Option<String>, LlmError>;

/// Owned copy of one request the client received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub variant: ModelVariant,
    pub instruction: String,
    pub document: String,
    pub temperature: f32,
}

#[derive(Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<ScriptedReply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn new(script: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, in call order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

pub fn reply(text: &str) -> ScriptedReply {
    Ok(Some(text.to_string()))
}

pub fn context_overflow() -> ScriptedReply {
    Err(LlmError::ContextLengthExceeded {
        model: "scripted".to_string(),
        message: "This model's maximum context length is 4097 tokens.".to_string(),
    })
}

pub fn api_error(status: u16) -> ScriptedReply {
    Err(LlmError::Api {
        status,
        message: "scripted failure".to_string(),
    })
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn complete(&self, request: &ExtractionRequest<'_>) -> Result<Option<String>, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            variant: request.variant,
            instruction: request.instruction.to_string(),
            document: request.document_content.to_string(),
            temperature: request.temperature,
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("script exhausted after {} calls", self.call_count()))
    }
}
