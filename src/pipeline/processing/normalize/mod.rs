//! Schema normalization: source-specific raw records into [`UniversalRecord`]s.

pub mod normalizers;
pub mod registry;

use serde::{Deserialize, Serialize};

use crate::domain::UniversalRecord;
use crate::error::NormalizationError;

pub use registry::NormalizationRegistry;

/// A record exactly as a scraper emitted it, plus the source it was submitted under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    /// Declared source tag
    pub source: String,
    /// Scraper output; shape depends on `source`
    pub record: serde_json::Value,
}

impl RawRecord {
    pub fn new(source: impl Into<String>, record: serde_json::Value) -> Self {
        Self {
            source: source.into(),
            record,
        }
    }

    /// Best-effort id for reporting, before normalization has succeeded.
    pub fn raw_id(&self) -> Option<String> {
        match self.record.get("id")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Trait for mapping raw records into the universal schema
pub trait Normalizer {
    fn normalize(&self, record: &RawRecord) -> Result<UniversalRecord, NormalizationError>;
}
