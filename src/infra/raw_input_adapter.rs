use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

use crate::pipeline::processing::normalize::RawRecord;

/// Read a scraper's JSONL output, one raw record per line, tagged with `source`.
///
/// A line that is not JSON is passed through as a string value so the
/// normalizer rejects it like any other malformed record.
pub fn read_raw_records(path: &Path, source: &str) -> Result<Vec<RawRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut records = Vec::new();

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = serde_json::from_str(trimmed).unwrap_or_else(|e| {
            warn!(line = index + 1, error = %e, "raw line is not valid JSON");
            Value::String(trimmed.to_string())
        });
        records.push(RawRecord::new(source, value));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_lines_and_keeps_bad_ones() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id": "1", "selftext": "hello"}}"#).unwrap();
        writeln!(file, "   ").unwrap();
        writeln!(file, "{{broken").unwrap();

        let records = read_raw_records(file.path(), "reddit").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].raw_id().as_deref(), Some("1"));
        assert_eq!(records[1].record, Value::String("{broken".to_string()));
        assert!(records.iter().all(|r| r.source == "reddit"));
    }
}
