//! @ai:module:intent CSV result sink with per-record durable appends
//! @ai:module:layer infrastructure
//! @ai:module:public_api ResultSink, read_records
//! @ai:module:stateless false

use crate::sink::record::{split_row, ResultRecord};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// @ai:intent Append-only dataset file; every append is flushed and synced
///
/// Nothing is buffered across calls, so a run killed after N appends leaves
/// exactly N complete rows behind.
pub struct ResultSink {
    path: PathBuf,
    file: File,
    appended: usize,
}

impl ResultSink {
    /// @ai:intent Create (or truncate) the dataset file, creating parent directories
    /// @ai:effects fs:write
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("Failed to open results file {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            appended: 0,
        })
    }

    /// @ai:effects fs:write
    pub fn write_header(&mut self, columns: &[&str]) -> Result<()> {
        self.write_line(&columns.join(","))
    }

    /// @ai:intent Durably append one record before returning
    /// @ai:effects fs:write
    pub fn append(&mut self, record: &ResultRecord) -> Result<()> {
        self.write_line(&record.to_csv_row())?;
        self.appended += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended through this handle.
    pub fn appended(&self) -> usize {
        self.appended
    }

    /// One `write_all` per line keeps a record from being split across writes.
    fn write_line(&mut self, line: &str) -> Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        self.file
            .write_all(buf.as_bytes())
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_data())
            .with_context(|| format!("Failed to write results to {}", self.path.display()))
    }
}

/// @ai:intent Read every record from a dataset written by `ResultSink`
/// @ai:pre first line is a header naming the columns
/// @ai:effects fs:read
pub fn read_records(path: &Path) -> Result<Vec<ResultRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results file {}", path.display()))?;

    let mut lines = content.lines();
    let header = match lines.next() {
        Some(header) => header,
        None => return Ok(Vec::new()),
    };

    let columns: HashMap<String, usize> = split_row(header)?
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect();

    lines
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            ResultRecord::from_csv_row(line, &columns)
                .with_context(|| format!("{}: bad row {}", path.display(), i + 2))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::record::RESULT_COLUMNS;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn record(i: usize) -> ResultRecord {
        ResultRecord {
            model_id: format!("vendor.model-{}", i % 2),
            question_id: i,
            iteration: 1,
            duration: 0.25 * i as f64,
            input_tokens: 6000,
            output_tokens: i as u64,
            total_tokens: 6000 + i as u64,
            tokens_per_minute: 100.5 * i as f64,
            success: i % 3 != 0,
        }
    }

    #[test]
    fn test_appends_survive_dropped_handle() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("benchmark.csv");

        let written: Vec<ResultRecord> = (1..=7).map(record).collect();
        {
            let mut sink = ResultSink::open(&path).unwrap();
            sink.write_header(&RESULT_COLUMNS).unwrap();

            for r in &written {
                sink.append(r).unwrap();
            }
            assert_eq!(sink.appended(), 7);
            // dropped without any explicit close
        }

        let read = read_records(&path).unwrap();
        assert_eq!(read, written);
    }

    #[test]
    fn test_rows_visible_before_sink_is_dropped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("benchmark.csv");

        let mut sink = ResultSink::open(&path).unwrap();
        sink.write_header(&RESULT_COLUMNS).unwrap();
        sink.append(&record(1)).unwrap();
        sink.append(&record(2)).unwrap();

        let read = read_records(&path).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[1], record(2));
    }

    #[test]
    fn test_header_only_file_has_no_records() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("benchmark.csv");

        let mut sink = ResultSink::open(&path).unwrap();
        sink.write_header(&RESULT_COLUMNS).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, format!("{}\n", RESULT_COLUMNS.join(",")));
        assert!(read_records(&path).unwrap().is_empty());
    }

    #[test]
    fn test_open_truncates_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("benchmark.csv");
        std::fs::write(&path, "stale contents\n").unwrap();

        let mut sink = ResultSink::open(&path).unwrap();
        sink.write_header(&RESULT_COLUMNS).unwrap();

        assert!(!std::fs::read_to_string(&path).unwrap().contains("stale"));
    }

    #[test]
    fn test_bad_row_reports_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("benchmark.csv");
        std::fs::write(&path, format!("{}\nnot,a,row\n", RESULT_COLUMNS.join(","))).unwrap();

        let err = read_records(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("bad row 2"));
    }
}
