use chrono::Utc;
use std::collections::HashMap;
use tracing::debug;

use super::normalizers::{
    GovernmentNormalizer, HardwareZoneNormalizer, MetricsNormalizer, PropertyGuruNormalizer, RedditNormalizer,
    SourceNormalizer,
};
use super::{Normalizer, RawRecord};
use crate::domain::{Source, Timestamp, UniversalRecord};
use crate::error::NormalizationError;

/// Registry for source-specific normalization strategies
pub struct NormalizationRegistry {
    normalizers: HashMap<Source, Box<dyn SourceNormalizer>>,
    run_started_at: Timestamp,
}

impl NormalizationRegistry {
    /// Create a new normalization registry with the built-in normalizers,
    /// stamping records that lack `scraped_at` with the current time.
    pub fn new() -> Self {
        Self::with_run_timestamp(Timestamp::from_datetime(Utc::now()))
    }

    /// Registry whose fallback `scraped_at` is fixed, so repeated runs are byte-identical.
    pub fn with_run_timestamp(run_started_at: Timestamp) -> Self {
        let mut normalizers: HashMap<Source, Box<dyn SourceNormalizer>> = HashMap::new();

        normalizers.insert(Source::Reddit, Box::new(MetricsNormalizer::new(RedditNormalizer::new())));
        normalizers.insert(Source::Government, Box::new(MetricsNormalizer::new(GovernmentNormalizer::new())));
        normalizers.insert(Source::PropertyGuru, Box::new(MetricsNormalizer::new(PropertyGuruNormalizer::new())));
        normalizers.insert(Source::HardwareZone, Box::new(MetricsNormalizer::new(HardwareZoneNormalizer::new())));

        Self {
            normalizers,
            run_started_at,
        }
    }

    /// Get the appropriate normalizer for a source
    pub fn get_normalizer(&self, source: Source) -> Option<&dyn SourceNormalizer> {
        self.normalizers.get(&source).map(|n| n.as_ref())
    }

    /// List all registered sources
    pub fn list_sources(&self) -> Vec<Source> {
        let mut sources: Vec<Source> = self.normalizers.keys().copied().collect();
        sources.sort();
        sources
    }

    /// Resolve the declared source and check it against any tag the record carries.
    fn resolve_source(record: &RawRecord) -> Result<Source, NormalizationError> {
        if record.source.trim().is_empty() {
            return Err(NormalizationError::MissingField("source".to_string()));
        }
        let declared: Source = record.source.parse()?;

        if let Some(tag) = record.record.get("source").and_then(|v| v.as_str()) {
            let found: Source = tag.parse()?;
            if found != declared {
                return Err(NormalizationError::SourceMismatch {
                    declared: declared.to_string(),
                    found: found.to_string(),
                });
            }
        }
        Ok(declared)
    }
}

impl Default for NormalizationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for NormalizationRegistry {
    fn normalize(&self, record: &RawRecord) -> Result<UniversalRecord, NormalizationError> {
        let source = Self::resolve_source(record)?;
        let normalizer = self
            .get_normalizer(source)
            .ok_or_else(|| NormalizationError::UnknownSource(source.to_string()))?;

        debug!(source = %source, normalizer = normalizer.name(), "normalizing record");
        normalizer.normalize(record, &self.run_started_at)
    }
}
