//! One record per line, UTF-8 JSON.
//!
//! Output files are named `{source}_{YYYYMMDD}_{NNN}.jsonl` where the date is
//! the record's scrape date and `NNN` a 1-based batch counter, at most
//! [`MAX_BATCH_NUMBER`] per source and date.

use chrono::NaiveDate;

use crate::domain::{Source, UniversalRecord};
use crate::error::Result;

/// Serialize a record to a single line with no trailing newline.
///
/// `serde_json` escapes control characters inside strings, so embedded
/// newlines in content never split a record across lines.
pub fn encode_line(record: &UniversalRecord) -> Result<String> {
    Ok(serde_json::to_string(record)?)
}

pub fn decode_line(line: &str) -> Result<UniversalRecord> {
    Ok(serde_json::from_str(line.trim_end_matches(['\r', '\n']))?)
}

/// Highest batch counter that still fits in three digits
pub const MAX_BATCH_NUMBER: u32 = 999;

/// `None` when `batch` is 0 or would need more than three digits.
pub fn file_name(source: Source, date: NaiveDate, batch: u32) -> Option<String> {
    if !(1..=MAX_BATCH_NUMBER).contains(&batch) {
        return None;
    }
    Some(format!("{}_{}_{:03}.jsonl", source, date.format("%Y%m%d"), batch))
}
