//! Turns a directory of CV files into ordered `Document`s.
//!
//! Plain text and Markdown are read directly; PDFs go through `pdf-extract`.
//! Files are returned sorted by name so repeated runs see the same order.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::extraction::models::Document;

const TEXT_EXTENSIONS: [&str; 2] = ["txt", "md"];
const PDF_EXTENSION: &str = "pdf";

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Cannot read corpus directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read CV file {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot extract text from PDF {}: {message}", path.display())]
    Pdf { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Text,
    Pdf,
}

fn source_kind(path: &Path) -> Option<SourceKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceKind::Text)
    } else if ext == PDF_EXTENSION {
        Some(SourceKind::Pdf)
    } else {
        None
    }
}

/// Reads every supported CV in `dir`. Any read failure aborts the load.
pub fn load_corpus(dir: &Path) -> Result<Vec<Document>, CorpusError> {
    let dir_error = |source: std::io::Error| CorpusError::Directory {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(dir_error)? {
        let entry = entry.map_err(dir_error)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match source_kind(&path) {
            Some(kind) => files.push((path, kind)),
            None => debug!("Ignoring unsupported file {}", path.display()),
        }
    }
    files.sort_by(|(a, _), (b, _)| a.file_name().cmp(&b.file_name()));

    let mut documents = Vec::with_capacity(files.len());
    for (path, kind) in files {
        let content = match kind {
            SourceKind::Text => read_text(&path)?,
            SourceKind::Pdf => read_pdf(&path)?,
        };

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if content.trim().is_empty() {
            warn!("{filename}: no text content, skipping");
            continue;
        }

        documents.push(Document { filename, content });
    }

    Ok(documents)
}

fn read_text(path: &Path) -> Result<String, CorpusError> {
    let bytes = std::fs::read(path).map_err(|source| CorpusError::File {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_pdf(path: &Path) -> Result<String, CorpusError> {
    pdf_extract::extract_text(path).map_err(|e| CorpusError::Pdf {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
