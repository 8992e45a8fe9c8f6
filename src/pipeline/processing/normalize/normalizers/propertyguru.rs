use serde_json::Value;

use crate::domain::{
    Location, PropertyGuruMetadata, Rating, RatingConfidence, RatingMethod, Source, SourceMetadata, Timestamp,
    UniversalRecord,
};
use crate::error::NormalizationError;
use crate::pipeline::processing::normalize::RawRecord;

use super::base::{BaseFields, FieldMap, NormalizerUtils, SourceNormalizer};

const FIELDS: FieldMap = FieldMap {
    id: &["id"],
    url: &["url"],
    title: &["title"],
    content: &["content", "review_text"],
};

/// Normalizer for PropertyGuru reviews, forum posts and investment Q&A
///
/// The review scraper reports a bare numeric `rating` plus a `rating_confidence`
/// of "explicit" (stars given by the reviewer) or "inferred" (derived from text),
/// and the reviewed project's area as a plain `location` string.
pub struct PropertyGuruNormalizer;

impl PropertyGuruNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn scraper_rating(data: &Value) -> Result<Option<Rating>, NormalizationError> {
        let value = match data.get("rating") {
            Some(Value::Number(n)) => n.as_f64(),
            _ => return NormalizerUtils::rating(data.get("rating")),
        };
        let Some(value) = value else {
            return Ok(None);
        };

        let rating = match data.get("rating_confidence").and_then(|v| v.as_str()) {
            Some("explicit") => Rating {
                explicit: Some(value),
                inferred: None,
                confidence: RatingConfidence::High,
                method: RatingMethod::Explicit,
            },
            Some("inferred") => Rating {
                explicit: None,
                inferred: Some(value),
                confidence: RatingConfidence::Medium,
                method: RatingMethod::Keyword,
            },
            _ => Rating {
                explicit: None,
                inferred: Some(value),
                confidence: RatingConfidence::Low,
                method: RatingMethod::Keyword,
            },
        };
        Ok(Some(rating))
    }

    /// Fold the scraper's area string and property type into the location object.
    fn merge_location(existing: Option<Location>, data: &Value) -> Option<Location> {
        let mut location = existing.unwrap_or_default();
        if let Some(area) = data.get("location").and_then(|v| v.as_str()) {
            let area = area.trim();
            if !area.is_empty() && !location.mentioned_areas.iter().any(|a| a == area) {
                location.mentioned_areas.push(area.to_string());
            }
        }
        if let Some(kind) = NormalizerUtils::opt_str(data, "property_type") {
            if !location.property_types.contains(&kind) {
                location.property_types.push(kind);
            }
        }
        if location.is_empty() {
            None
        } else {
            Some(location)
        }
    }
}

impl Default for PropertyGuruNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for PropertyGuruNormalizer {
    fn normalize(&self, record: &RawRecord, run_started_at: &Timestamp) -> Result<UniversalRecord, NormalizationError> {
        let data = &record.record;
        let mut base = BaseFields::extract(data, &FIELDS, run_started_at)?;

        base.rating = Self::scraper_rating(data)?;
        base.location = Self::merge_location(base.location.take(), data);

        let metadata = PropertyGuruMetadata {
            property_name: NormalizerUtils::opt_str(data, "property_name"),
            property_type: NormalizerUtils::opt_str(data, "property_type"),
            review_type: NormalizerUtils::opt_str(data, "review_type"),
            reviewer_profile: NormalizerUtils::opt_str(data, "reviewer_profile"),
            author: NormalizerUtils::opt_str(data, "author"),
            date_posted: NormalizerUtils::timestamp(data, "date_posted")?,
        };

        Ok(base.into_record(Source::PropertyGuru, SourceMetadata::PropertyGuru(metadata)))
    }

    fn source(&self) -> Source {
        Source::PropertyGuru
    }

    fn name(&self) -> &str {
        "PropertyGuru"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts() -> Timestamp {
        Timestamp::from_raw("2025-01-01T00:00:00Z")
    }

    #[test]
    fn test_explicit_review_rating_is_high_confidence() {
        let raw = RawRecord::new(
            "propertyguru",
            json!({
                "id": "pg-rev-881",
                "title": "Great condo near MRT",
                "content": "Lived here three years, facilities are well kept and the MRT is a short walk.",
                "rating": 4.5,
                "rating_confidence": "explicit",
                "property_name": "The Tapestry",
                "property_type": "Condo",
                "location": "Tampines",
                "reviewer_profile": "verified_resident",
                "url": "https://www.propertyguru.com.sg/property-reviews/881",
                "date_posted": "2024-11-02"
            }),
        );
        let record = PropertyGuruNormalizer::new().normalize(&raw, &ts()).unwrap();

        let rating = record.rating.clone().unwrap();
        assert_eq!(rating.explicit, Some(4.5));
        assert_eq!(rating.confidence, RatingConfidence::High);

        let location = record.location.clone().unwrap();
        assert_eq!(location.mentioned_areas, vec!["Tampines".to_string()]);
        assert_eq!(location.property_types, vec!["Condo".to_string()]);
        assert!(location.coordinates.is_none());
    }

    #[test]
    fn test_inferred_rating_and_structured_rating_object() {
        let inferred = RawRecord::new(
            "propertyguru",
            json!({
                "id": "pg-2", "url": "https://pg.sg/2", "content": "Decent but noisy at night near the expressway.",
                "rating": 3.0, "rating_confidence": "inferred"
            }),
        );
        let record = PropertyGuruNormalizer::new().normalize(&inferred, &ts()).unwrap();
        let rating = record.rating.unwrap();
        assert_eq!(rating.inferred, Some(3.0));
        assert_eq!(rating.confidence, RatingConfidence::Medium);

        let structured = RawRecord::new(
            "propertyguru",
            json!({
                "id": "pg-3", "url": "https://pg.sg/3", "content": "Structured rating from the sentiment stage.",
                "rating": {"explicit": null, "inferred": 2.5, "confidence": "low", "method": "hybrid"}
            }),
        );
        let record = PropertyGuruNormalizer::new().normalize(&structured, &ts()).unwrap();
        assert_eq!(record.rating.unwrap().method, RatingMethod::Hybrid);
    }
}
