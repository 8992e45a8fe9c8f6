use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

use crate::error::ValidationError;
use crate::pipeline::processing::validate::{SchemaValidator, ValidationVerdict, Validator};
use crate::pipeline::storage::decode_line;

/// Use case for re-validating an existing universal-record JSONL file
pub struct CheckUseCase {
    validator: Box<dyn Validator + Send + Sync>,
}

impl Default for CheckUseCase {
    fn default() -> Self {
        Self::new(Box::new(SchemaValidator::new()))
    }
}

impl CheckUseCase {
    pub fn new(validator: Box<dyn Validator + Send + Sync>) -> Self {
        Self { validator }
    }

    pub fn check_file(&self, path: &Path) -> Result<CheckReport> {
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let mut report = CheckReport::default();

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            let line_number = index + 1;
            report.total_lines += 1;

            match decode_line(&line) {
                Ok(record) => match self.validator.validate(&record) {
                    ValidationVerdict::Valid => report.valid_count += 1,
                    ValidationVerdict::Invalid(errors) => {
                        warn!(line = line_number, id = %record.id, "stored record fails validation");
                        report.invalid.push(InvalidLine {
                            line: line_number,
                            id: Some(record.id),
                            errors,
                            decode_error: None,
                        });
                    }
                },
                Err(e) => {
                    warn!(line = line_number, error = %e, "line is not a universal record");
                    report.invalid.push(InvalidLine {
                        line: line_number,
                        id: None,
                        errors: Vec::new(),
                        decode_error: Some(e.to_string()),
                    });
                }
            }
        }

        info!(
            "Checked {} records in {}: {} valid, {} invalid",
            report.total_lines,
            path.display(),
            report.valid_count,
            report.invalid.len()
        );
        Ok(report)
    }
}

#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    pub total_lines: usize,
    pub valid_count: usize,
    pub invalid: Vec<InvalidLine>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty()
    }
}

#[derive(Debug, Serialize)]
pub struct InvalidLine {
    pub line: usize,
    pub id: Option<String>,
    pub errors: Vec<ValidationError>,
    pub decode_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID: &str = r#"{"id":"abc","source":"reddit","scraped_at":"2025-03-01T08:00:00Z","url":"https://reddit.com/abc","title":"","content":"A resale flat in Bishan near the MRT station","metadata":{"source":"reddit","subreddit":"singapore","author":null,"score":3,"upvote_ratio":null,"num_comments":null,"created_at":null,"permalink":null},"sentiment":null,"rating":null,"location":null,"quality_score":0.4,"processing_flags":[]}"#;

    #[test]
    fn test_check_file_reports_each_bad_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", VALID).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{}", VALID.replace("A resale flat in Bishan near the MRT station", "short")).unwrap();
        writeln!(file, "not json").unwrap();

        let report = CheckUseCase::default().check_file(file.path()).unwrap();
        assert_eq!(report.total_lines, 3);
        assert_eq!(report.valid_count, 1);
        assert_eq!(report.invalid.len(), 2);
        assert_eq!(report.invalid[0].line, 3);
        assert_eq!(report.invalid[0].errors[0].field, "content");
        assert_eq!(report.invalid[1].line, 4);
        assert!(report.invalid[1].decode_error.is_some());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(CheckUseCase::default().check_file(Path::new("/nonexistent/records.jsonl")).is_err());
    }
}
