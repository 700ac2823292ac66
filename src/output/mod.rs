//! Durable, append-only JSONL persistence.
//!
//! One record per line, each write flushed before returning, so every
//! append is a durability checkpoint and an interrupted run loses at most
//! the row in flight. Resuming rebuilds the seen set by replaying the
//! file's identifiers.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::models::DetailRecord;

/// Append-only writer over the output JSONL file.
pub struct JsonlWriter {
    file: File,
}

impl JsonlWriter {
    /// Open `path` for appending and rebuild the set of identifiers already
    /// written to it. Malformed lines are skipped, not fatal - a prior run
    /// may have died mid-process, but never mid-line.
    pub fn open(path: &Path) -> std::io::Result<(Self, HashSet<String>)> {
        let seen = Self::load_seen(path);
        if !seen.is_empty() {
            info!("Resume set: {} identifiers already written", seen.len());
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok((Self { file }, seen))
    }

    /// Collect the identifiers present in an existing output file.
    fn load_seen(path: &Path) -> HashSet<String> {
        let mut seen = HashSet::new();
        let Ok(file) = File::open(path) else {
            return seen; // no prior output
        };

        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<DetailRecord>(&line) {
                Ok(record) => {
                    seen.insert(record.k_number);
                }
                Err(e) => {
                    warn!("Skipping malformed output line {}: {}", line_no + 1, e);
                }
            }
        }
        seen
    }

    /// Serialize one record as a single line, write it whole, and flush.
    /// After this returns the record is durable.
    pub fn append(&mut self, record: &DetailRecord) -> std::io::Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        debug!("Appended {}", record.k_number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PdfType;

    fn record(id: &str) -> DetailRecord {
        DetailRecord {
            k_number: id.to_string(),
            device_name: "Device".to_string(),
            applicant: "Acme".to_string(),
            decision_date: "01/01/2024".to_string(),
            detail_link: format!("https://example.test/pmn.cfm?ID={id}"),
            summary_link: None,
            summary_text: Some("text".to_string()),
            pdf_type: PdfType::Summary,
        }
    }

    #[test]
    fn append_then_reopen_recovers_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let (mut writer, seen) = JsonlWriter::open(&path).unwrap();
        assert!(seen.is_empty());
        writer.append(&record("K1")).unwrap();
        writer.append(&record("K2")).unwrap();
        drop(writer);

        let (_, seen) = JsonlWriter::open(&path).unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("K1"));
        assert!(seen.contains("K2"));
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let (mut writer, _) = JsonlWriter::open(&path).unwrap();
        writer.append(&record("K1")).unwrap();
        drop(writer);

        // Simulate a partial line from a crash mid-write
        std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"{\"k_number\": \"K2\", \"device")
            .unwrap();

        let (_, seen) = JsonlWriter::open(&path).unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen.contains("K1"));
    }

    #[test]
    fn each_record_is_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let (mut writer, _) = JsonlWriter::open(&path).unwrap();
        writer.append(&record("K1")).unwrap();
        writer.append(&record("K2")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        for line in content.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value["k_number"].is_string());
        }
    }
}
