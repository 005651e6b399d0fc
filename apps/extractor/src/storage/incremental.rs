//! Append-only CSV of extracted skills, updated after every completed CV.
//!
//! Header emission is decided once, when the store is opened: a missing or
//! empty file gets the header, an existing one is appended to. A trailing row
//! without its newline, left by a write that never finished, is cut off before
//! appending so the next row starts on a line of its own. Each row
//! is flushed and synced before `append` returns, so an interrupted run keeps
//! every row written so far.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::extraction::models::CvRecord;
use crate::storage::StoreError;

pub const HEADER: [&str; 2] = ["CV_Filename", "Skills"];

/// One row as read back from the store. `skills` is the serialized JSON list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    #[serde(rename = "CV_Filename")]
    pub filename: String,
    #[serde(rename = "Skills")]
    pub skills: String,
}

pub struct IncrementalStore {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows_appended: usize,
}

impl IncrementalStore {
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let needs_header = drop_torn_tail(&path)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;

        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);

        let mut store = Self {
            path,
            writer,
            rows_appended: 0,
        };

        if needs_header {
            store.writer.write_record(HEADER)?;
            store.sync()?;
            info!("Created incremental store at {}", store.path.display());
        } else {
            info!("Appending to existing store at {}", store.path.display());
        }

        Ok(store)
    }

    /// Writes one record as a single durable row.
    pub fn append(&mut self, record: &CvRecord) -> Result<(), StoreError> {
        let skills = serde_json::to_string(&record.skills)?;
        self.writer
            .write_record([record.filename.as_str(), skills.as_str()])?;
        self.sync()?;
        self.rows_appended += 1;
        debug!("Appended {} to {}", record.filename, self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_appended(&self) -> usize {
        self.rows_appended
    }

    fn sync(&mut self) -> Result<(), StoreError> {
        self.writer
            .flush()
            .map_err(|e| StoreError::io(&self.path, e))?;
        self.writer
            .get_ref()
            .sync_data()
            .map_err(|e| StoreError::io(&self.path, e))
    }
}

/// Truncates the file back to its last newline if the final row was left
/// unterminated. Returns whether the store still needs its header.
fn drop_torn_tail(path: &Path) -> Result<bool, StoreError> {
    let contents = match std::fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    if contents.last().map_or(true, |&b| b == b'\n') {
        return Ok(contents.is_empty());
    }

    let keep = contents
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    warn!(
        "{}: dropping {} bytes of an unfinished trailing row",
        path.display(),
        contents.len() - keep
    );

    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| StoreError::io(path, e))?;
    file.set_len(keep as u64)
        .map_err(|e| StoreError::io(path, e))?;
    file.sync_data().map_err(|e| StoreError::io(path, e))?;

    Ok(keep == 0)
}

/// Reads every data row of the store. A store that was never created reads as empty.
pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<StoredRow>, StoreError> {
    let path = path.as_ref();
    let mut reader = match csv::Reader::from_path(path) {
        Ok(reader) => reader,
        Err(e) => {
            if let csv::ErrorKind::Io(io) = e.kind() {
                if io.kind() == ErrorKind::NotFound {
                    return Ok(Vec::new());
                }
            }
            return Err(e.into());
        }
    };

    reader
        .deserialize()
        .collect::<Result<Vec<StoredRow>, _>>()
        .map_err(StoreError::from)
}
