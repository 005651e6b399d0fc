//! Strict decoding of the model's reply into a `ParsedPayload`.
//!
//! The reply must be a single JSON object. Markdown fences, leading prose or
//! truncated output are failures; nothing is salvaged from a partial reply.

use serde_json::Value;
use thiserror::Error;

use crate::extraction::models::ParsedPayload;

#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("model returned no choices")]
    EmptyReply,

    #[error("reply is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("reply is JSON but not an object")]
    NotAnObject,

    #[error("reply does not match the skills payload: {0}")]
    Shape(#[source] serde_json::Error),
}

/// Decodes a raw model reply. An absent reply is treated like unparseable text.
pub fn parse_reply(raw: Option<&str>) -> Result<ParsedPayload, ParseFailure> {
    let raw = raw.ok_or(ParseFailure::EmptyReply)?;

    let value: Value = serde_json::from_str(raw).map_err(ParseFailure::InvalidJson)?;

    // Decoding straight into the struct would also accept a JSON array
    // positionally, so the object check comes first.
    if !value.is_object() {
        return Err(ParseFailure::NotAnObject);
    }

    serde_json::from_value(value).map_err(ParseFailure::Shape)
}
