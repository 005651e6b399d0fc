//! Drives one document through the model call, reply parsing and
//! normalization, escalating to the larger model when the CV does not fit.
//!
//! Per-document state machine:
//!
//! ```text
//! Attempting(Standard) ──ContextLengthExceeded──▶ Attempting(Extended)
//!        │                                              │
//!        └──────────── reply ──▶ ParseCheck ◀── reply ──┘
//!                                   │
//!                      Completed(CvRecord) | Skipped(reason)
//! ```
//!
//! Only a context-length rejection moves to the next variant, and there is only
//! one tier above the default. Every other failure skips the document.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::extraction::models::{CvRecord, Document};
use crate::extraction::normalizer::normalize;
use crate::extraction::parser::{parse_reply, ParseFailure};
use crate::llm_client::{ExtractionRequest, LlmError, ModelClient, ModelVariant, RejectionKind};

/// Why a document produced no record.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("model API error: {0}")]
    Api(#[source] LlmError),

    #[error("context length exceeded even after escalation: {0}")]
    EscalatedContextLengthExceeded(#[source] LlmError),

    #[error("unusable model reply: {0}")]
    Parse(#[from] ParseFailure),
}

#[derive(Debug)]
pub enum Outcome {
    Completed(CvRecord),
    Skipped(SkipReason),
}

enum AttemptState {
    Attempting(ModelVariant),
    ParseCheck(Option<String>),
}

pub struct Extractor {
    client: Arc<dyn ModelClient>,
    instruction: String,
    temperature: f32,
    /// Minimum delay before every model call.
    pacing: Duration,
}

impl Extractor {
    pub fn new(
        client: Arc<dyn ModelClient>,
        instruction: String,
        temperature: f32,
        pacing: Duration,
    ) -> Self {
        Self {
            client,
            instruction,
            temperature,
            pacing,
        }
    }

    /// Resolves a document to exactly one terminal outcome.
    pub async fn extract(&self, document: &Document) -> Outcome {
        let mut state = AttemptState::Attempting(ModelVariant::Standard);

        loop {
            state = match state {
                AttemptState::Attempting(variant) => match self.call(document, variant).await {
                    Ok(reply) => AttemptState::ParseCheck(reply),
                    Err(e) if e.kind() == RejectionKind::ContextLengthExceeded => {
                        match variant.escalate() {
                            Some(next) => {
                                warn!(
                                    "{}: does not fit {:?} model ({e}), escalating to {:?}",
                                    document.filename, variant, next
                                );
                                AttemptState::Attempting(next)
                            }
                            None => {
                                return Outcome::Skipped(
                                    SkipReason::EscalatedContextLengthExceeded(e),
                                )
                            }
                        }
                    }
                    Err(e) => return Outcome::Skipped(SkipReason::Api(e)),
                },
                AttemptState::ParseCheck(reply) => {
                    return match parse_reply(reply.as_deref()) {
                        Ok(payload) => Outcome::Completed(normalize(&document.filename, payload)),
                        Err(failure) => Outcome::Skipped(failure.into()),
                    };
                }
            };
        }
    }

    async fn call(
        &self,
        document: &Document,
        variant: ModelVariant,
    ) -> Result<Option<String>, LlmError> {
        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }

        debug!("{}: calling {:?} model", document.filename, variant);

        self.client
            .complete(&ExtractionRequest {
                instruction: &self.instruction,
                document_content: &document.content,
                variant,
                temperature: self.temperature,
            })
            .await
    }
}
