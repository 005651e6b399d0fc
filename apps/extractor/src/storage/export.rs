//! End-of-run exports.
//!
//! Records are kept in memory for the whole run and written out once at the
//! end: a JSON dump of the accumulation, and a spreadsheet rendered from the
//! incremental store as it stands on disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use tracing::info;

use crate::extraction::models::CvRecord;
use crate::storage::incremental::{read_all, StoredRow, HEADER};
use crate::storage::StoreError;

pub const STORE_FILE_NAME: &str = "CVs_Info_Extracted.csv";
pub const SPREADSHEET_FILE_NAME: &str = "CVs_Info_Extracted.xlsx";
pub const DUMP_FILE_NAME: &str = "All_CVs_Info.json";

const SHEET_NAME: &str = "CVs";

/// Locations of every artifact a run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub store: PathBuf,
    pub dump: PathBuf,
    pub spreadsheet: PathBuf,
}

impl ExportPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            store: dir.join(STORE_FILE_NAME),
            dump: dir.join(DUMP_FILE_NAME),
            spreadsheet: dir.join(SPREADSHEET_FILE_NAME),
        }
    }
}

/// In-memory accumulation of every record completed during one run.
#[derive(Debug, Default)]
pub struct BatchAccumulator {
    records: Vec<CvRecord>,
}

impl BatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, record: CvRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Writes the JSON dump and the spreadsheet, then returns the rows read
    /// back from the store. Consumes the accumulator; call once per run.
    pub fn finalize(self, paths: &ExportPaths) -> Result<Vec<StoredRow>, StoreError> {
        write_json_dump(&self.records, &paths.dump)?;
        info!(
            "Saved {} CV records to {}",
            self.records.len(),
            paths.dump.display()
        );

        let rows = read_all(&paths.store)?;
        write_spreadsheet(&rows, &paths.spreadsheet)?;
        info!(
            "Saved {} rows to {}",
            rows.len(),
            paths.spreadsheet.display()
        );

        Ok(rows)
    }
}

/// Overwrites `path` with the records as a 4-space indented JSON array.
fn write_json_dump(records: &[CvRecord], path: &Path) -> Result<(), StoreError> {
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    records.serialize(&mut serializer)?;

    writer.flush().map_err(|e| StoreError::io(path, e))
}

fn write_spreadsheet(rows: &[StoredRow], path: &Path) -> Result<(), StoreError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, title) in HEADER.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let line = index as u32 + 1;
        worksheet.write_string(line, 0, row.filename.as_str())?;
        worksheet.write_string(line, 1, row.skills.as_str())?;
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::models::SkillEntry;
    use crate::storage::incremental::IncrementalStore;

    fn record(filename: &str, skill: &str, level: &str) -> CvRecord {
        CvRecord {
            filename: filename.to_string(),
            skills: vec![SkillEntry {
                skill: skill.to_string(),
                proficiency: Some(level.to_string()),
            }],
        }
    }

    #[test]
    fn test_export_paths_use_fixed_file_names() {
        let paths = ExportPaths::in_dir("/tmp/out");
        assert_eq!(paths.store, PathBuf::from("/tmp/out/CVs_Info_Extracted.csv"));
        assert_eq!(paths.dump, PathBuf::from("/tmp/out/All_CVs_Info.json"));
        assert_eq!(
            paths.spreadsheet,
            PathBuf::from("/tmp/out/CVs_Info_Extracted.xlsx")
        );
    }

    #[test]
    fn test_finalize_writes_dump_in_accumulation_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ExportPaths::in_dir(dir.path());

        let mut store = IncrementalStore::open_or_create(&paths.store).unwrap();
        let mut accumulator = BatchAccumulator::new();
        for rec in [record("a.txt", "Rust", "Expert"), record("b.txt", "SQL", "Basic")] {
            store.append(&rec).unwrap();
            accumulator.accumulate(rec);
        }
        assert_eq!(accumulator.len(), 2);

        let rows = accumulator.finalize(&paths).unwrap();
        assert_eq!(rows.len(), 2);

        let dump: Vec<CvRecord> =
            serde_json::from_str(&std::fs::read_to_string(&paths.dump).unwrap()).unwrap();
        let names: Vec<_> = dump.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert!(paths.spreadsheet.exists());
    }

    #[test]
    fn test_dump_uses_four_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.json");

        write_json_dump(&[record("a.txt", "Rust", "Expert")], &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n    {\n        \"CV_Filename\": \"a.txt\""));
    }

    #[test]
    fn test_finalize_with_nothing_accumulated() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ExportPaths::in_dir(dir.path());

        let accumulator = BatchAccumulator::new();
        assert!(accumulator.is_empty());
        let rows = accumulator.finalize(&paths).unwrap();

        assert!(rows.is_empty());
        assert_eq!(std::fs::read_to_string(&paths.dump).unwrap(), "[]");
        assert!(paths.spreadsheet.exists());
    }

    #[test]
    fn test_dump_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ExportPaths::in_dir(dir.path());
        std::fs::write(&paths.dump, "stale content that is much longer than the new dump").unwrap();

        BatchAccumulator::new().finalize(&paths).unwrap();

        assert_eq!(std::fs::read_to_string(&paths.dump).unwrap(), "[]");
    }
}
