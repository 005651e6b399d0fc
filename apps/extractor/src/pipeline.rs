//! Runs the corpus through the extractor, one CV at a time.
//!
//! Flow: open store → for each document: extract → (append to store →
//!       accumulate) → finalize exports → report.
//!
//! A completed record hits the store before the next document starts; the
//! JSON dump and spreadsheet are only written after the last document.

use tracing::{info, warn};

use crate::errors::AppError;
use crate::extraction::models::Document;
use crate::extraction::orchestrator::{Extractor, Outcome};
use crate::storage::export::{BatchAccumulator, ExportPaths};
use crate::storage::incremental::{IncrementalStore, StoredRow};

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    /// The store as read back at the end of the run.
    pub rows: Vec<StoredRow>,
}

pub async fn run(
    extractor: &Extractor,
    corpus: &[Document],
    paths: &ExportPaths,
) -> Result<RunReport, AppError> {
    let total = corpus.len();
    info!("---- Executing CV extraction pipeline on {total} CVs ----");

    let mut store = IncrementalStore::open_or_create(&paths.store)?;
    let mut accumulator = BatchAccumulator::new();
    let mut skipped = 0;

    for (index, document) in corpus.iter().enumerate() {
        let position = index + 1;
        match extractor.extract(document).await {
            Outcome::Completed(record) => {
                store.append(&record)?;
                info!(
                    "[{position}/{total}] {}: completed ({} skills)",
                    record.filename,
                    record.skills.len()
                );
                accumulator.accumulate(record);
            }
            Outcome::Skipped(reason) => {
                skipped += 1;
                warn!("[{position}/{total}] {}: skipped, {reason}", document.filename);
            }
        }
    }

    let completed = accumulator.len();
    info!(
        "Extraction completed: {completed} of {total} CVs ({skipped} skipped, {} rows appended to {})",
        store.rows_appended(),
        store.path().display()
    );
    drop(store);

    if accumulator.is_empty() && total > 0 {
        warn!("No CV produced a record; this run's JSON dump will be empty");
    }

    let rows = accumulator.finalize(paths)?;

    Ok(RunReport {
        total,
        completed,
        skipped,
        rows,
    })
}
