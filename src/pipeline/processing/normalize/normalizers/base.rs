use serde_json::Value;
use std::collections::BTreeSet;

use crate::domain::{
    Location, Rating, RatingConfidence, RatingMethod, Sentiment, SentimentLabel, Source, SourceMetadata,
    Timestamp, UniversalRecord,
};
use crate::error::NormalizationError;
use crate::observability::metrics;
use crate::pipeline::processing::normalize::RawRecord;

/// Base trait for source-specific normalizers
pub trait SourceNormalizer: Send + Sync {
    /// Map one raw record of this source into the universal schema.
    /// `run_started_at` stands in for a missing `scraped_at`.
    fn normalize(&self, record: &RawRecord, run_started_at: &Timestamp) -> Result<UniversalRecord, NormalizationError>;

    /// The source this normalizer handles
    fn source(&self) -> Source;

    /// Get a human-readable name for this normalizer
    fn name(&self) -> &str;
}

/// A wrapper that adds metrics to any normalizer implementation
pub struct MetricsNormalizer<N: SourceNormalizer> {
    inner: N,
}

impl<N: SourceNormalizer> MetricsNormalizer<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

impl<N: SourceNormalizer> SourceNormalizer for MetricsNormalizer<N> {
    fn normalize(&self, record: &RawRecord, run_started_at: &Timestamp) -> Result<UniversalRecord, NormalizationError> {
        let source = self.inner.source();
        match self.inner.normalize(record, run_started_at) {
            Ok(normalized) => {
                metrics::normalize::record_normalized(source.as_str());
                Ok(normalized)
            }
            Err(e) => {
                metrics::normalize::record_failed(source.as_str());
                Err(e)
            }
        }
    }

    fn source(&self) -> Source {
        self.inner.source()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Which raw keys feed each base-schema field, in lookup order.
pub struct FieldMap {
    pub id: &'static [&'static str],
    pub url: &'static [&'static str],
    pub title: &'static [&'static str],
    pub content: &'static [&'static str],
}

/// Base-schema fields shared by every source, before metadata is attached.
#[derive(Debug, Clone)]
pub struct BaseFields {
    pub id: String,
    pub scraped_at: Timestamp,
    pub url: String,
    pub title: String,
    pub content: String,
    pub sentiment: Option<Sentiment>,
    pub rating: Option<Rating>,
    pub location: Option<Location>,
    pub processing_flags: BTreeSet<String>,
}

impl BaseFields {
    /// Extract the base schema using a source's field map.
    pub fn extract(data: &Value, fields: &FieldMap, run_started_at: &Timestamp) -> Result<Self, NormalizationError> {
        if !data.is_object() {
            return Err(NormalizationError::NotAnObject);
        }

        let id = NormalizerUtils::first_id(data, fields.id)
            .ok_or_else(|| NormalizationError::MissingField("id".to_string()))?;
        let url = NormalizerUtils::first_str(data, fields.url)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| NormalizationError::MissingField("url".to_string()))?;
        let content = NormalizerUtils::first_str(data, fields.content)
            .ok_or_else(|| NormalizationError::MissingField("content".to_string()))?;
        let title = NormalizerUtils::first_str(data, fields.title).unwrap_or_default();

        let scraped_at = NormalizerUtils::timestamp(data, "scraped_at")?.unwrap_or_else(|| run_started_at.clone());

        Ok(Self {
            id,
            scraped_at,
            url,
            title,
            content,
            sentiment: NormalizerUtils::sentiment(data.get("sentiment"))?,
            rating: NormalizerUtils::rating(data.get("rating"))?,
            location: NormalizerUtils::location(data.get("location"))?,
            processing_flags: NormalizerUtils::external_flags(data),
        })
    }

    pub fn into_record(self, source: Source, metadata: SourceMetadata) -> UniversalRecord {
        UniversalRecord {
            id: self.id,
            source,
            scraped_at: self.scraped_at,
            url: self.url,
            title: self.title,
            content: self.content,
            metadata,
            sentiment: self.sentiment,
            rating: self.rating,
            location: self.location,
            quality_score: 0.0,
            processing_flags: self.processing_flags,
        }
    }
}

/// Shared utilities for normalizers
pub struct NormalizerUtils;

impl NormalizerUtils {
    fn invalid(field: &str, reason: impl Into<String>) -> NormalizationError {
        NormalizationError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// First non-empty id among `keys`; numeric ids are stringified.
    pub fn first_id(data: &Value, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| match data.get(*k) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    /// First string value among `keys`.
    pub fn first_str(data: &Value, keys: &[&str]) -> Option<String> {
        keys.iter()
            .find_map(|k| data.get(*k).and_then(|v| v.as_str()))
            .map(|s| s.to_string())
    }

    /// Optional string, with empty strings treated as absent.
    pub fn opt_str(data: &Value, key: &str) -> Option<String> {
        data.get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    }

    pub fn opt_i64(data: &Value, key: &str) -> Option<i64> {
        data.get(key).and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
    }

    pub fn opt_u64(data: &Value, key: &str) -> Option<u64> {
        data.get(key).and_then(|v| v.as_u64().or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)))
    }

    pub fn opt_f64(data: &Value, key: &str) -> Option<f64> {
        data.get(key).and_then(|v| v.as_f64())
    }

    pub fn string_list(data: &Value, key: &str) -> Vec<String> {
        data.get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A date-bearing field: strings are canonicalized, numbers read as epoch seconds.
    pub fn timestamp(data: &Value, key: &str) -> Result<Option<Timestamp>, NormalizationError> {
        match data.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(Timestamp::from_raw(s))),
            Some(Value::Number(n)) => n
                .as_f64()
                .and_then(Timestamp::from_epoch_seconds)
                .map(Some)
                .ok_or_else(|| Self::invalid(key, "epoch seconds out of range")),
            Some(_) => Err(Self::invalid(key, "expected a date string or epoch seconds")),
        }
    }

    pub fn sentiment(value: Option<&Value>) -> Result<Option<Sentiment>, NormalizationError> {
        let obj = match value {
            None | Some(Value::Null) => return Ok(None),
            Some(v @ Value::Object(_)) => v,
            Some(_) => return Err(Self::invalid("sentiment", "expected an object")),
        };
        let score = obj
            .get("score")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| Self::invalid("sentiment.score", "expected a number"))?;
        let confidence = obj
            .get("confidence")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| Self::invalid("sentiment.confidence", "expected a number"))?;
        let label = match obj.get("label").and_then(|v| v.as_str()) {
            Some(label) => Self::sentiment_label(label)?,
            None => Self::label_for_score(score),
        };
        Ok(Some(Sentiment { score, confidence, label }))
    }

    fn sentiment_label(label: &str) -> Result<SentimentLabel, NormalizationError> {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(SentimentLabel::Positive),
            "negative" => Ok(SentimentLabel::Negative),
            "neutral" => Ok(SentimentLabel::Neutral),
            other => Err(Self::invalid("sentiment.label", format!("unknown label '{}'", other))),
        }
    }

    /// Label for sources that report a bare polarity score.
    pub fn label_for_score(score: f64) -> SentimentLabel {
        if score > 0.1 {
            SentimentLabel::Positive
        } else if score < -0.1 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn rating(value: Option<&Value>) -> Result<Option<Rating>, NormalizationError> {
        let obj = match value {
            None | Some(Value::Null) => return Ok(None),
            Some(v @ Value::Object(_)) => v,
            // Bare star counts are interpreted per source.
            Some(Value::Number(_)) => return Ok(None),
            Some(_) => return Err(Self::invalid("rating", "expected an object")),
        };
        let explicit = Self::rating_value(obj, "explicit")?;
        let inferred = Self::rating_value(obj, "inferred")?;
        if explicit.is_none() && inferred.is_none() {
            return Ok(None);
        }

        let confidence = match obj.get("confidence").and_then(|v| v.as_str()) {
            Some("high") => RatingConfidence::High,
            Some("medium") => RatingConfidence::Medium,
            Some("low") => RatingConfidence::Low,
            Some(other) => return Err(Self::invalid("rating.confidence", format!("unknown confidence '{}'", other))),
            None => return Err(Self::invalid("rating.confidence", "missing")),
        };
        let method = match obj.get("method").and_then(|v| v.as_str()) {
            Some("explicit") => RatingMethod::Explicit,
            Some("sentiment") => RatingMethod::Sentiment,
            Some("keyword") => RatingMethod::Keyword,
            Some("hybrid") => RatingMethod::Hybrid,
            Some(other) => return Err(Self::invalid("rating.method", format!("unknown method '{}'", other))),
            None => return Err(Self::invalid("rating.method", "missing")),
        };

        Ok(Some(Rating {
            explicit,
            inferred,
            confidence,
            method,
        }))
    }

    fn rating_value(obj: &Value, key: &str) -> Result<Option<f64>, NormalizationError> {
        match obj.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| Self::invalid(&format!("rating.{}", key), "expected a number or null")),
        }
    }

    /// Location object; `None` when it carries nothing.
    pub fn location(value: Option<&Value>) -> Result<Option<Location>, NormalizationError> {
        let obj = match value {
            None | Some(Value::Null) => return Ok(None),
            Some(v @ Value::Object(_)) => v,
            // Some scrapers emit a bare area name; handled per source.
            Some(Value::String(_)) => return Ok(None),
            Some(_) => return Err(Self::invalid("location", "expected an object")),
        };
        let location = Location {
            mentioned_areas: Self::string_list(obj, "mentioned_areas"),
            property_types: Self::string_list(obj, "property_types"),
            coordinates: Self::coordinates(obj.get("coordinates"))?,
        };
        Ok(if location.is_empty() { None } else { Some(location) })
    }

    fn coordinates(value: Option<&Value>) -> Result<Option<(f64, f64)>, NormalizationError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(pair)) if pair.len() == 2 => match (pair[0].as_f64(), pair[1].as_f64()) {
                (Some(lat), Some(lng)) => Ok(Some((lat, lng))),
                _ => Err(Self::invalid("location.coordinates", "expected two numbers")),
            },
            Some(obj @ Value::Object(_)) => match (Self::opt_f64(obj, "lat"), Self::opt_f64(obj, "lng")) {
                (Some(lat), Some(lng)) => Ok(Some((lat, lng))),
                _ => Err(Self::invalid("location.coordinates", "expected lat and lng")),
            },
            Some(_) => Err(Self::invalid("location.coordinates", "expected [lat, lng]")),
        }
    }

    /// Flags already asserted upstream, e.g. by the sentiment model.
    pub fn external_flags(data: &Value) -> BTreeSet<String> {
        Self::string_list(data, "processing_flags").into_iter().collect()
    }
}
