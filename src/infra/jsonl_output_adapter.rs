use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

use crate::app::ports::RecordSink;
use crate::domain::{Source, UniversalRecord};
use crate::pipeline::storage::{encode_line, file_name, MAX_BATCH_NUMBER};

struct OpenBatch {
    batch: u32,
    written: usize,
    writer: BufWriter<File>,
}

/// File-based implementation of RecordSink.
///
/// Writes one JSONL file per source and scrape date, starting a new numbered
/// file once `max_records_per_file` lines have been written. Existing files
/// are never overwritten; numbering resumes after the highest one on disk.
pub struct JsonlRecordSink {
    dir: PathBuf,
    max_records_per_file: usize,
    open: Mutex<HashMap<(Source, NaiveDate), OpenBatch>>,
    files_written: Mutex<Vec<PathBuf>>,
}

impl JsonlRecordSink {
    pub fn new(dir: impl AsRef<Path>, max_records_per_file: usize) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        info!("Writing accepted records under {}", dir.display());

        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            open: Mutex::new(HashMap::new()),
            files_written: Mutex::new(Vec::new()),
        })
    }

    /// Every file this sink has created, in creation order
    pub fn files_written(&self) -> Vec<PathBuf> {
        self.files_written
            .lock()
            .map(|files| files.clone())
            .unwrap_or_default()
    }

    fn open_batch(&self, source: Source, date: NaiveDate, after: u32) -> anyhow::Result<OpenBatch> {
        let mut batch = after + 1;
        let path = loop {
            let name = file_name(source, date, batch).ok_or_else(|| {
                anyhow!("No free batch number for {} on {} (limit {})", source, date, MAX_BATCH_NUMBER)
            })?;
            let path = self.dir.join(name);
            if !path.exists() {
                break path;
            }
            batch += 1;
        };
        info!("Creating record output file: {}", path.display());

        let file = OpenOptions::new().create_new(true).write(true).open(&path)?;
        if let Ok(mut files) = self.files_written.lock() {
            files.push(path);
        }
        Ok(OpenBatch {
            batch,
            written: 0,
            writer: BufWriter::new(file),
        })
    }
}

#[async_trait::async_trait]
impl RecordSink for JsonlRecordSink {
    async fn write_record(&self, record: &UniversalRecord) -> anyhow::Result<()> {
        let line = encode_line(record)?;
        let date = record
            .scraped_at
            .parse()
            .unwrap_or_else(Utc::now)
            .date_naive();
        let key = (record.source, date);

        let mut open = self
            .open
            .lock()
            .map_err(|_| anyhow!("record sink lock poisoned"))?;

        let needs_rotation = open
            .get(&key)
            .map_or(true, |b| b.written >= self.max_records_per_file);
        if needs_rotation {
            let after = match open.remove(&key) {
                Some(mut full) => {
                    full.writer.flush()?;
                    full.batch
                }
                None => 0,
            };
            open.insert(key, self.open_batch(record.source, date, after)?);
        }

        if let Some(batch) = open.get_mut(&key) {
            writeln!(batch.writer, "{}", line)?;
            batch.written += 1;
        }
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut open = self
            .open
            .lock()
            .map_err(|_| anyhow!("record sink lock poisoned"))?;
        for batch in open.values_mut() {
            batch.writer.flush()?;
        }
        Ok(())
    }
}
