//! Weighted quality rubric.
//!
//! Each factor is an independent pure function of the record returning a
//! sub-score in [0, 1]; the total is a fixed-weight blend. Every tier boundary
//! is inclusive on its lower edge, so a value sitting exactly on a boundary
//! lands in the higher tier. The one exception is sentiment confidence, whose
//! top tier starts strictly above 0.8.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::COUNTRY_AREA;
use crate::domain::{RatingConfidence, Source, UniversalRecord};

pub const CONTENT_LENGTH_WEIGHT: f64 = 0.20;
pub const SOURCE_RELIABILITY_WEIGHT: f64 = 0.30;
pub const SENTIMENT_CONFIDENCE_WEIGHT: f64 = 0.20;
pub const LOCATION_SPECIFICITY_WEIGHT: f64 = 0.15;
pub const TEMPORAL_RELEVANCE_WEIGHT: f64 = 0.15;

/// Per-factor sub-scores and the blended total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub content_length: f64,
    pub source_reliability: f64,
    pub sentiment_confidence: f64,
    pub location_specificity: f64,
    pub temporal_relevance: f64,
    /// Weighted total, clamped to [0, 1]
    pub quality_score: f64,
}

/// Trait for implementing quality scoring logic
pub trait QualityScorer {
    /// Score a record as of `now`; ages are measured against it.
    fn assess(&self, record: &UniversalRecord, now: DateTime<Utc>) -> QualityAssessment;
}

/// The fixed five-factor rubric
#[derive(Debug, Clone, Default)]
pub struct WeightedQualityScorer;

impl WeightedQualityScorer {
    pub fn new() -> Self {
        Self
    }
}

impl QualityScorer for WeightedQualityScorer {
    fn assess(&self, record: &UniversalRecord, now: DateTime<Utc>) -> QualityAssessment {
        let content_length = content_length_score(record);
        let source_reliability = source_reliability_score(record);
        let sentiment_confidence = sentiment_confidence_score(record);
        let location_specificity = location_specificity_score(record);
        let temporal_relevance = temporal_relevance_score(record, now);

        let total = CONTENT_LENGTH_WEIGHT * content_length
            + SOURCE_RELIABILITY_WEIGHT * source_reliability
            + SENTIMENT_CONFIDENCE_WEIGHT * sentiment_confidence
            + LOCATION_SPECIFICITY_WEIGHT * location_specificity
            + TEMPORAL_RELEVANCE_WEIGHT * temporal_relevance;

        QualityAssessment {
            content_length,
            source_reliability,
            sentiment_confidence,
            location_specificity,
            temporal_relevance,
            quality_score: total.clamp(0.0, 1.0),
        }
    }
}

/// <50 chars → 0.0, 50..200 → 0.5, ≥200 → 1.0
pub fn content_length_score(record: &UniversalRecord) -> f64 {
    match record.content_length() {
        0..=49 => 0.0,
        50..=199 => 0.5,
        _ => 1.0,
    }
}

/// Government first, then verified PropertyGuru reviews, then the forums.
/// An unverified PropertyGuru record matches no band and scores 0.0.
pub fn source_reliability_score(record: &UniversalRecord) -> f64 {
    let verified_review = record.source == Source::PropertyGuru
        && record
            .rating
            .as_ref()
            .is_some_and(|r| r.confidence == RatingConfidence::High);

    match record.source {
        Source::Government => 1.0,
        Source::PropertyGuru if verified_review => 0.9,
        Source::Reddit => 0.7,
        Source::HardwareZone => 0.6,
        Source::PropertyGuru => 0.0,
    }
}

/// >0.8 → 1.0, [0.5, 0.8] → 0.7, <0.5 → 0.3, no sentiment → 0.0
pub fn sentiment_confidence_score(record: &UniversalRecord) -> f64 {
    match &record.sentiment {
        None => 0.0,
        Some(s) if s.confidence > 0.8 => 1.0,
        Some(s) if s.confidence >= 0.5 => 0.7,
        Some(_) => 0.3,
    }
}

/// Any area more specific than the country → 1.0, only the country → 0.5, none → 0.0
pub fn location_specificity_score(record: &UniversalRecord) -> f64 {
    let areas: Vec<&str> = record
        .mentioned_areas()
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();

    if areas.iter().any(|a| *a != COUNTRY_AREA) {
        1.0
    } else if areas.is_empty() {
        0.0
    } else {
        0.5
    }
}

/// ≤6 months → 1.0, ≤12 → 0.8, ≤24 → 0.6, older or undatable → 0.3
pub fn temporal_relevance_score(record: &UniversalRecord, now: DateTime<Utc>) -> f64 {
    let Some(reference) = record.reference_time() else {
        return 0.3;
    };

    let tiers = [(6, 1.0), (12, 0.8), (24, 0.6)];
    for (months, score) in tiers {
        match now.checked_sub_months(Months::new(months)) {
            Some(cutoff) if reference >= cutoff => return score,
            Some(_) => continue,
            // `now` is so early that no cutoff exists; everything is recent
            None => return score,
        }
    }
    0.3
}

/// Quality tier label for a total score
pub fn quality_tier(score: f64) -> &'static str {
    use crate::constants::{flags, HIGH_QUALITY_THRESHOLD, MEDIUM_QUALITY_THRESHOLD};
    if score >= HIGH_QUALITY_THRESHOLD {
        flags::HIGH_QUALITY
    } else if score >= MEDIUM_QUALITY_THRESHOLD {
        flags::MEDIUM_QUALITY
    } else {
        flags::LOW_QUALITY
    }
}
