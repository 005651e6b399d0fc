use thiserror::Error;

use crate::corpus::CorpusError;
use crate::storage::StoreError;

/// Run-fatal errors.
///
/// Per-document failures never show up here: the orchestrator turns them into
/// `Outcome::Skipped` and the run carries on. Only losing access to the corpus
/// or to durable storage stops a run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}
