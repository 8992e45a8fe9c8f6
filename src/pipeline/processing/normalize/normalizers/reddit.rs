use crate::domain::{RedditMetadata, Source, SourceMetadata, Timestamp, UniversalRecord};
use crate::error::NormalizationError;
use crate::pipeline::processing::normalize::RawRecord;

use super::base::{BaseFields, FieldMap, NormalizerUtils, SourceNormalizer};

const FIELDS: FieldMap = FieldMap {
    id: &["id"],
    url: &["url", "permalink"],
    title: &["title"],
    content: &["content", "selftext", "body"],
};

/// Normalizer for r/singapore, r/askSingapore and r/singaporefi posts
pub struct RedditNormalizer;

impl RedditNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RedditNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for RedditNormalizer {
    fn normalize(&self, record: &RawRecord, run_started_at: &Timestamp) -> Result<UniversalRecord, NormalizationError> {
        let data = &record.record;
        let base = BaseFields::extract(data, &FIELDS, run_started_at)?;

        // created_utc is epoch seconds; created_date is the scraper's isoformat copy
        let created_at = match NormalizerUtils::timestamp(data, "created_utc")? {
            Some(ts) => Some(ts),
            None => NormalizerUtils::timestamp(data, "created_date")?,
        };

        let metadata = RedditMetadata {
            subreddit: NormalizerUtils::opt_str(data, "subreddit"),
            author: NormalizerUtils::opt_str(data, "author"),
            score: NormalizerUtils::opt_i64(data, "score"),
            upvote_ratio: NormalizerUtils::opt_f64(data, "upvote_ratio"),
            num_comments: NormalizerUtils::opt_u64(data, "num_comments"),
            created_at,
            permalink: NormalizerUtils::opt_str(data, "permalink"),
        };

        Ok(base.into_record(Source::Reddit, SourceMetadata::Reddit(metadata)))
    }

    fn source(&self) -> Source {
        Source::Reddit
    }

    fn name(&self) -> &str {
        "Reddit"
    }
}
