use anyhow::anyhow;
use chrono::NaiveDate;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

use crate::app::ports::RejectionSink;
use crate::pipeline::Rejection;

/// File-based implementation of RejectionSink.
/// Appends one JSON line per rejected record to `rejections_{YYYYMMDD}.jsonl`.
pub struct FileRejectionSink {
    file_writer: Mutex<BufWriter<File>>,
    file_path: PathBuf,
}

impl FileRejectionSink {
    pub fn new(dir: impl AsRef<Path>, run_date: NaiveDate) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let file_path = dir.join(format!("rejections_{}.jsonl", run_date.format("%Y%m%d")));

        info!("Appending rejection report to {}", file_path.display());

        let file_writer = BufWriter::new(OpenOptions::new().create(true).append(true).open(&file_path)?);
        Ok(Self {
            file_writer: Mutex::new(file_writer),
            file_path,
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

#[async_trait::async_trait]
impl RejectionSink for FileRejectionSink {
    async fn write_rejection(&self, rejection: &Rejection) -> anyhow::Result<()> {
        let json_line = serde_json::to_string(rejection)?;

        let mut writer = self
            .file_writer
            .lock()
            .map_err(|_| anyhow!("rejection sink lock poisoned"))?;
        writeln!(writer, "{}", json_line)?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut writer = self
            .file_writer
            .lock()
            .map_err(|_| anyhow!("rejection sink lock poisoned"))?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NormalizationError;
    use crate::pipeline::RejectionReason;

    #[tokio::test]
    async fn test_rejections_are_appended_as_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let rejection = Rejection {
            id: None,
            source: "edgeprop".to_string(),
            reason: RejectionReason::Normalization(NormalizationError::UnknownSource("edgeprop".to_string())),
            record: None,
        };

        for _ in 0..2 {
            let sink = FileRejectionSink::new(dir.path(), date).unwrap();
            sink.write_rejection(&rejection).await.unwrap();
            sink.flush().await.unwrap();
        }

        let body = std::fs::read_to_string(dir.path().join("rejections_20250301.jsonl")).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: Rejection = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, rejection);
        assert!(lines[0].contains("\"stage\":\"normalization\""));
    }
}
