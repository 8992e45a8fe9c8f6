//! Boundary-contract checks on normalized records.
//!
//! Every check runs and every violation is reported (collect-all), always in
//! the same order, so a rejection lists the complete set of reasons.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    MIN_CONTENT_CHARS, RATING_RANGE, SENTIMENT_CONFIDENCE_RANGE, SENTIMENT_SCORE_RANGE, UPVOTE_RATIO_RANGE,
};
use crate::domain::{SourceMetadata, UniversalRecord};
use crate::error::{ValidationError, ValidationRule};

/// Outcome of validating one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "reasons", rename_all = "snake_case")]
pub enum ValidationVerdict {
    Valid,
    Invalid(Vec<ValidationError>),
}

impl ValidationVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationVerdict::Valid)
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ValidationVerdict::Valid => &[],
            ValidationVerdict::Invalid(errors) => errors,
        }
    }
}

/// Trait for checking records against the schema invariants
pub trait Validator {
    fn validate(&self, record: &UniversalRecord) -> ValidationVerdict;
}

/// Validator for the universal record contract
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    fn check_identity(record: &UniversalRecord, errors: &mut Vec<ValidationError>) {
        if record.id.trim().is_empty() {
            errors.push(ValidationError::new("id", ValidationRule::Required, "id must be non-empty"));
        }
        if record.metadata.source() != record.source {
            errors.push(ValidationError::new(
                "metadata",
                ValidationRule::MetadataShape,
                format!(
                    "metadata shape is for '{}' but record source is '{}'",
                    record.metadata.source(),
                    record.source
                ),
            ));
        }
        if record.url.trim().is_empty() {
            errors.push(ValidationError::new("url", ValidationRule::Required, "url must be non-empty"));
        } else if !is_absolute_url(&record.url) {
            errors.push(ValidationError::new(
                "url",
                ValidationRule::Format,
                format!("'{}' is not an absolute URL with a host", record.url),
            ));
        }
    }

    fn check_metadata(record: &UniversalRecord, errors: &mut Vec<ValidationError>) {
        if let SourceMetadata::Reddit(meta) = &record.metadata {
            if let Some(ratio) = meta.upvote_ratio {
                check_range(errors, "metadata.upvote_ratio", ratio, UPVOTE_RATIO_RANGE);
            }
        }
    }

    fn check_content(record: &UniversalRecord, errors: &mut Vec<ValidationError>) {
        let len = record.content_length();
        if len < MIN_CONTENT_CHARS {
            errors.push(ValidationError::new(
                "content",
                ValidationRule::MinLength,
                format!("content has {} characters, minimum is {}", len, MIN_CONTENT_CHARS),
            ));
        }
    }

    fn check_sentiment(record: &UniversalRecord, errors: &mut Vec<ValidationError>) {
        let Some(sentiment) = &record.sentiment else {
            return;
        };
        check_range(errors, "sentiment.score", sentiment.score, SENTIMENT_SCORE_RANGE);
        check_range(errors, "sentiment.confidence", sentiment.confidence, SENTIMENT_CONFIDENCE_RANGE);
    }

    fn check_rating(record: &UniversalRecord, errors: &mut Vec<ValidationError>) {
        let Some(rating) = &record.rating else {
            return;
        };
        if let Some(explicit) = rating.explicit {
            check_range(errors, "rating.explicit", explicit, RATING_RANGE);
        }
        if let Some(inferred) = rating.inferred {
            check_range(errors, "rating.inferred", inferred, RATING_RANGE);
        }
    }

    fn check_timestamps(record: &UniversalRecord, errors: &mut Vec<ValidationError>) {
        let fields = std::iter::once(("scraped_at", &record.scraped_at)).chain(record.metadata.timestamps());
        for (field, ts) in fields {
            if ts.parse().is_none() {
                errors.push(ValidationError::new(
                    field,
                    ValidationRule::Timestamp,
                    format!("'{}' is not a valid UTC timestamp", ts),
                ));
            }
        }
    }
}

/// Scheme and host must both be present, e.g. `https://www.propertyguru.com.sg/...`
fn is_absolute_url(raw: &str) -> bool {
    match Url::parse(raw.trim()) {
        Ok(url) => url.host_str().is_some_and(|host| !host.is_empty()),
        Err(_) => false,
    }
}

fn check_range(errors: &mut Vec<ValidationError>, field: &str, value: f64, (min, max): (f64, f64)) {
    // NaN fails the containment test and is reported here too
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::new(
            field,
            ValidationRule::Range,
            format!("{} is outside [{}, {}]", value, min, max),
        ));
    }
}

impl Validator for SchemaValidator {
    fn validate(&self, record: &UniversalRecord) -> ValidationVerdict {
        let mut errors = Vec::new();

        Self::check_identity(record, &mut errors);
        Self::check_content(record, &mut errors);
        Self::check_sentiment(record, &mut errors);
        Self::check_rating(record, &mut errors);
        check_range(&mut errors, "quality_score", record.quality_score, (0.0, 1.0));
        Self::check_metadata(record, &mut errors);
        Self::check_timestamps(record, &mut errors);

        if errors.is_empty() {
            ValidationVerdict::Valid
        } else {
            ValidationVerdict::Invalid(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        GovernmentMetadata, Rating, RatingConfidence, RatingMethod, RedditMetadata, Sentiment, SentimentLabel,
        Source, SourceMetadata, Timestamp,
    };
    use std::collections::BTreeSet;

    fn valid_record() -> UniversalRecord {
        UniversalRecord {
            id: "reddit_test_123".to_string(),
            source: Source::Reddit,
            scraped_at: Timestamp::from_raw("2024-01-15T10:30:00Z"),
            url: "https://reddit.com/r/singapore/comments/test/".to_string(),
            title: "Test property discussion".to_string(),
            content: "This is a test discussion about HDB prices in Punggol.".to_string(),
            metadata: SourceMetadata::Reddit(RedditMetadata::default()),
            sentiment: Some(Sentiment {
                score: -0.2,
                confidence: 0.75,
                label: SentimentLabel::Negative,
            }),
            rating: Some(Rating {
                explicit: None,
                inferred: Some(2.8),
                confidence: RatingConfidence::Medium,
                method: RatingMethod::Sentiment,
            }),
            location: None,
            quality_score: 0.0,
            processing_flags: BTreeSet::new(),
        }
    }

    fn rules(verdict: &ValidationVerdict) -> Vec<(&str, ValidationRule)> {
        verdict.errors().iter().map(|e| (e.field.as_str(), e.rule)).collect()
    }

    #[test]
    fn test_valid_record_passes() {
        assert_eq!(SchemaValidator::new().validate(&valid_record()), ValidationVerdict::Valid);
    }

    #[test]
    fn test_short_content_cites_min_length() {
        let mut record = valid_record();
        record.content = "too short!".to_string();

        let verdict = SchemaValidator::new().validate(&record);
        assert_eq!(rules(&verdict), vec![("content", ValidationRule::MinLength)]);
    }

    #[test]
    fn test_content_of_exactly_twenty_chars_passes() {
        let mut record = valid_record();
        record.content = "a".repeat(20);
        assert!(SchemaValidator::new().validate(&record).is_valid());
    }

    #[test]
    fn test_explicit_rating_out_of_range_rejected_even_if_inferred_ok() {
        let mut record = valid_record();
        record.rating = Some(Rating {
            explicit: Some(6.0),
            inferred: Some(4.0),
            confidence: RatingConfidence::High,
            method: RatingMethod::Explicit,
        });

        let verdict = SchemaValidator::new().validate(&record);
        assert_eq!(rules(&verdict), vec![("rating.explicit", ValidationRule::Range)]);
    }

    #[test]
    fn test_all_violations_are_collected_in_order() {
        let mut record = valid_record();
        record.url = "  ".to_string();
        record.content = "short".to_string();
        record.sentiment.as_mut().unwrap().score = 1.5;
        record.scraped_at = Timestamp::from_raw("yesterday");
        record.metadata = SourceMetadata::Government(GovernmentMetadata::default());

        let verdict = SchemaValidator::new().validate(&record);
        assert_eq!(
            rules(&verdict),
            vec![
                ("metadata", ValidationRule::MetadataShape),
                ("url", ValidationRule::Required),
                ("content", ValidationRule::MinLength),
                ("sentiment.score", ValidationRule::Range),
                ("scraped_at", ValidationRule::Timestamp),
            ]
        );
    }

    #[test]
    fn test_nan_sentiment_confidence_is_out_of_range() {
        let mut record = valid_record();
        record.sentiment.as_mut().unwrap().confidence = f64::NAN;
        let verdict = SchemaValidator::new().validate(&record);
        assert_eq!(rules(&verdict), vec![("sentiment.confidence", ValidationRule::Range)]);
    }

    #[test]
    fn test_unparseable_metadata_date_is_rejected() {
        let mut record = valid_record();
        record.metadata = SourceMetadata::Reddit(RedditMetadata {
            created_at: Some(Timestamp::from_raw("31/02/2024")),
            ..Default::default()
        });
        let verdict = SchemaValidator::new().validate(&record);
        assert_eq!(rules(&verdict), vec![("metadata.created_at", ValidationRule::Timestamp)]);
    }

    #[test]
    fn test_url_without_scheme_or_host_is_rejected() {
        for url in ["www.propertyguru.com.sg/review/1", "not a url", "mailto:agent@example.com", "file:///tmp/x"] {
            let mut record = valid_record();
            record.url = url.to_string();
            let verdict = SchemaValidator::new().validate(&record);
            assert_eq!(rules(&verdict), vec![("url", ValidationRule::Format)], "url {url}");
        }
    }

    #[test]
    fn test_empty_url_reports_required_only() {
        let mut record = valid_record();
        record.url = String::new();
        let verdict = SchemaValidator::new().validate(&record);
        assert_eq!(rules(&verdict), vec![("url", ValidationRule::Required)]);
    }

    #[test]
    fn test_upvote_ratio_must_be_a_fraction() {
        let mut record = valid_record();
        record.metadata = SourceMetadata::Reddit(RedditMetadata {
            upvote_ratio: Some(1.5),
            ..Default::default()
        });
        let verdict = SchemaValidator::new().validate(&record);
        assert_eq!(rules(&verdict), vec![("metadata.upvote_ratio", ValidationRule::Range)]);

        record.metadata = SourceMetadata::Reddit(RedditMetadata {
            upvote_ratio: Some(0.92),
            ..Default::default()
        });
        assert!(SchemaValidator::new().validate(&record).is_valid());
    }
}
