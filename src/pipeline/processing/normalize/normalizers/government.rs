use crate::domain::{GovernmentMetadata, Source, SourceMetadata, Timestamp, UniversalRecord};
use crate::error::NormalizationError;
use crate::pipeline::processing::normalize::RawRecord;

use super::base::{BaseFields, FieldMap, NormalizerUtils, SourceNormalizer};

const FIELDS: FieldMap = FieldMap {
    id: &["id", "url"],
    url: &["url", "link"],
    title: &["title"],
    content: &["content", "summary"],
};

/// Normalizer for MND, HDB, URA and other agency press releases
pub struct GovernmentNormalizer;

impl GovernmentNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GovernmentNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for GovernmentNormalizer {
    fn normalize(&self, record: &RawRecord, run_started_at: &Timestamp) -> Result<UniversalRecord, NormalizationError> {
        let data = &record.record;
        let base = BaseFields::extract(data, &FIELDS, run_started_at)?;

        let metadata = GovernmentMetadata {
            source_agency: NormalizerUtils::opt_str(data, "source_agency")
                .or_else(|| NormalizerUtils::opt_str(data, "agency")),
            category: NormalizerUtils::opt_str(data, "category"),
            summary: NormalizerUtils::opt_str(data, "summary"),
            tags: NormalizerUtils::string_list(data, "tags"),
            published_date: NormalizerUtils::timestamp(data, "published_date")?,
        };

        Ok(base.into_record(Source::Government, SourceMetadata::Government(metadata)))
    }

    fn source(&self) -> Source {
        Source::Government
    }

    fn name(&self) -> &str {
        "Government releases"
    }
}
