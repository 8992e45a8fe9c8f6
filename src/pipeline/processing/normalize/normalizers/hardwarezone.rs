use serde_json::Value;

use crate::domain::{HardwareZoneMetadata, Sentiment, Source, SourceMetadata, Timestamp, UniversalRecord};
use crate::error::NormalizationError;
use crate::pipeline::processing::normalize::RawRecord;

use super::base::{BaseFields, FieldMap, NormalizerUtils, SourceNormalizer};

const FIELDS: FieldMap = FieldMap {
    id: &["id"],
    url: &["url", "post_url", "thread_url"],
    title: &["title", "thread_title"],
    content: &["content", "post_content"],
};

/// Normalizer for HardwareZone EDMW / property forum posts
pub struct HardwareZoneNormalizer;

impl HardwareZoneNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// The forum scraper attaches a flat score/confidence pair instead of a sentiment object.
    fn flat_sentiment(data: &Value) -> Option<Sentiment> {
        let score = NormalizerUtils::opt_f64(data, "sentiment_score")?;
        let confidence = NormalizerUtils::opt_f64(data, "sentiment_confidence")?;
        Some(Sentiment {
            score,
            confidence,
            label: NormalizerUtils::label_for_score(score),
        })
    }
}

impl Default for HardwareZoneNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for HardwareZoneNormalizer {
    fn normalize(&self, record: &RawRecord, run_started_at: &Timestamp) -> Result<UniversalRecord, NormalizationError> {
        let data = &record.record;
        let mut base = BaseFields::extract(data, &FIELDS, run_started_at)?;

        if base.sentiment.is_none() {
            base.sentiment = Self::flat_sentiment(data);
        }

        let metadata = HardwareZoneMetadata {
            thread_title: NormalizerUtils::opt_str(data, "thread_title"),
            thread_url: NormalizerUtils::opt_str(data, "thread_url"),
            author: NormalizerUtils::opt_str(data, "author"),
            post_number: NormalizerUtils::opt_u64(data, "post_number"),
            likes: NormalizerUtils::opt_u64(data, "likes"),
            replies_count: NormalizerUtils::opt_u64(data, "replies_count"),
            date_posted: NormalizerUtils::timestamp(data, "date_posted")?,
        };

        Ok(base.into_record(Source::HardwareZone, SourceMetadata::HardwareZone(metadata)))
    }

    fn source(&self) -> Source {
        Source::HardwareZone
    }

    fn name(&self) -> &str {
        "HardwareZone forums"
    }
}
