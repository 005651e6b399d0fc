// Per-document extraction: model call, reply parsing, escalation policy and
// normalization into the canonical CV record.
// All model calls go through llm_client. Nothing here touches the filesystem.

pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod parser;
