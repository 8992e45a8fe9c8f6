//! Universal record shapes shared by every pipeline stage.

mod metadata;
mod timestamp;

pub use metadata::{
    GovernmentMetadata, HardwareZoneMetadata, PropertyGuruMetadata, RedditMetadata, SourceMetadata,
};
pub use timestamp::Timestamp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::constants;
use crate::error::NormalizationError;

/// The scraper a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Reddit,
    Government,
    PropertyGuru,
    HardwareZone,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::Reddit,
        Source::Government,
        Source::PropertyGuru,
        Source::HardwareZone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Reddit => constants::REDDIT,
            Source::Government => constants::GOVERNMENT,
            Source::PropertyGuru => constants::PROPERTYGURU,
            Source::HardwareZone => constants::HARDWAREZONE,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = NormalizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            constants::REDDIT => Ok(Source::Reddit),
            constants::GOVERNMENT => Ok(Source::Government),
            constants::PROPERTYGURU => Ok(Source::PropertyGuru),
            constants::HARDWAREZONE => Ok(Source::HardwareZone),
            _ => Err(NormalizationError::UnknownSource(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

/// Output of the external sentiment model, carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Polarity in [-1.0, 1.0]
    pub score: f64,
    /// Model confidence in [0.0, 1.0]
    pub confidence: f64,
    pub label: SentimentLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingConfidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingMethod {
    Explicit,
    Sentiment,
    Keyword,
    Hybrid,
}

/// A 1-5 star rating, either stated by the author or inferred upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub explicit: Option<f64>,
    pub inferred: Option<f64>,
    pub confidence: RatingConfidence,
    pub method: RatingMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub mentioned_areas: Vec<String>,
    pub property_types: Vec<String>,
    /// (latitude, longitude), only when the source geocodes
    pub coordinates: Option<(f64, f64)>,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        self.mentioned_areas.is_empty() && self.property_types.is_empty() && self.coordinates.is_none()
    }
}

/// The normalized shape every source is mapped into.
///
/// Optional sub-objects serialize as explicit `null` rather than being omitted,
/// and `processing_flags` is ordered so the JSON line is byte-stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversalRecord {
    pub id: String,
    pub source: Source,
    pub scraped_at: Timestamp,
    pub url: String,
    pub title: String,
    pub content: String,
    pub metadata: SourceMetadata,
    pub sentiment: Option<Sentiment>,
    pub rating: Option<Rating>,
    pub location: Option<Location>,
    pub quality_score: f64,
    pub processing_flags: BTreeSet<String>,
}

impl UniversalRecord {
    /// Content length in characters, not bytes.
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }

    /// The timestamp age is measured from: publication date when the source
    /// supplies a parseable one, otherwise `scraped_at`.
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.metadata
            .published_at()
            .and_then(|ts| ts.parse())
            .or_else(|| self.scraped_at.parse())
    }

    pub fn mentioned_areas(&self) -> &[String] {
        self.location
            .as_ref()
            .map(|l| l.mentioned_areas.as_slice())
            .unwrap_or(&[])
    }
}
