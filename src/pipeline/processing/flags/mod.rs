//! Deterministic processing-flag derivation.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::constants::{
    flags, ENGLISH_FUNCTION_WORDS, ENGLISH_FUNCTION_WORD_MIN, MIN_CONTENT_CHARS, PROPERTY_KEYWORDS,
    REDDIT_HIGH_ENGAGEMENT_SCORE, SINGAPORE_BOUNDS, SINGAPORE_PLANNING_AREAS, SPAM_PATTERNS, SUFFICIENT_LENGTH_CHARS,
    VERIFIED_RESIDENT_PROFILE,
};
use crate::domain::{SourceMetadata, UniversalRecord};
use crate::pipeline::processing::dedupe::DedupVerdict;
use crate::pipeline::processing::quality_gate::{quality_tier, QualityAssessment};

static SPAM_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = SPAM_PATTERNS.iter().map(|p| regex::escape(p)).collect::<Vec<_>>().join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("spam patterns are valid regex")
});

static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = PROPERTY_KEYWORDS.iter().map(|p| regex::escape(p)).collect::<Vec<_>>().join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("property keywords are valid regex")
});

/// One row of the per-source rule table
struct SourceRule {
    flag: &'static str,
    applies: fn(&SourceMetadata) -> bool,
}

fn reddit_high_engagement(m: &SourceMetadata) -> bool {
    matches!(m, SourceMetadata::Reddit(r) if r.score.is_some_and(|s| s > REDDIT_HIGH_ENGAGEMENT_SCORE))
}

fn propertyguru_verified_review(m: &SourceMetadata) -> bool {
    matches!(m, SourceMetadata::PropertyGuru(p) if p.reviewer_profile.as_deref() == Some(VERIFIED_RESIDENT_PROFILE))
}

fn government_official_source(m: &SourceMetadata) -> bool {
    matches!(m, SourceMetadata::Government(g) if g.source_agency.is_some())
}

fn hardwarezone_thread_starter(m: &SourceMetadata) -> bool {
    matches!(m, SourceMetadata::HardwareZone(h) if h.post_number == Some(1))
}

const SOURCE_RULES: &[SourceRule] = &[
    SourceRule {
        flag: flags::HIGH_ENGAGEMENT,
        applies: reddit_high_engagement,
    },
    SourceRule {
        flag: flags::VERIFIED_REVIEW,
        applies: propertyguru_verified_review,
    },
    SourceRule {
        flag: flags::OFFICIAL_SOURCE,
        applies: government_official_source,
    },
    SourceRule {
        flag: flags::THREAD_STARTER,
        applies: hardwarezone_thread_starter,
    },
];

pub fn contains_spam(content: &str) -> bool {
    SPAM_RE.is_match(content)
}

/// True when at least two distinct English function words appear as whole words
pub fn is_english(content: &str) -> bool {
    let words: BTreeSet<String> = content.split_whitespace().map(str::to_lowercase).collect();
    ENGLISH_FUNCTION_WORDS.iter().filter(|w| words.contains(**w)).count() >= ENGLISH_FUNCTION_WORD_MIN
}

pub fn is_planning_area(area: &str) -> bool {
    let area = area.trim().to_lowercase();
    SINGAPORE_PLANNING_AREAS.contains(&area.as_str())
}

pub fn has_property_keywords(content: &str) -> bool {
    KEYWORD_RE.is_match(content)
}

/// Derives the final flag set. Pure: the same inputs always give the same set.
#[derive(Debug, Clone, Default)]
pub struct FlagDeriver;

impl FlagDeriver {
    pub fn new() -> Self {
        Self
    }

    pub fn derive(
        &self,
        record: &UniversalRecord,
        dedup: &DedupVerdict,
        assessment: &QualityAssessment,
    ) -> BTreeSet<String> {
        let mut out: BTreeSet<String> = record
            .processing_flags
            .iter()
            .filter(|f| !flags::ALL.contains(&f.as_str()))
            .cloned()
            .collect();
        let mut set = |flag: &str| {
            out.insert(flag.to_string());
        };

        set(if dedup.is_unique() {
            flags::DUPLICATE_CHECK_PASSED
        } else {
            flags::POTENTIAL_DUPLICATE
        });

        let len = record.content_length();
        if contains_spam(&record.content) {
            set(flags::POTENTIAL_SPAM);
        } else if len >= MIN_CONTENT_CHARS {
            set(flags::CONTENT_FILTERED);
        }
        if len >= SUFFICIENT_LENGTH_CHARS {
            set(flags::SUFFICIENT_LENGTH);
        }
        if has_property_keywords(&record.content) || has_property_keywords(&record.title) {
            set(flags::SINGAPORE_PROPERTY_KEYWORDS);
        }
        set(if is_english(&record.content) {
            flags::ENGLISH_CONTENT
        } else {
            flags::NON_STANDARD_ENGLISH
        });

        if let Some(sentiment) = &record.sentiment {
            set(flags::SENTIMENT_ANALYZED);
            set(if sentiment.confidence > 0.8 {
                flags::HIGH_SENTIMENT_CONFIDENCE
            } else if sentiment.confidence >= 0.5 {
                flags::MEDIUM_SENTIMENT_CONFIDENCE
            } else {
                flags::LOW_SENTIMENT_CONFIDENCE
            });
        }

        if let Some(rating) = &record.rating {
            set(flags::RATING_INFERRED);
            if rating.explicit.is_some() {
                set(flags::EXPLICIT_RATING_AVAILABLE);
            }
        }

        if let Some(location) = &record.location {
            set(flags::LOCATION_EXTRACTED);
            if !location.property_types.is_empty() {
                set(flags::PROPERTY_TYPE_IDENTIFIED);
            }
            if location.mentioned_areas.iter().any(|a| is_planning_area(a)) {
                set(flags::SINGAPORE_LOCATION);
            }
            let (lat_min, lat_max, lng_min, lng_max) = SINGAPORE_BOUNDS;
            if let Some((lat, lng)) = location.coordinates {
                if (lat_min..=lat_max).contains(&lat) && (lng_min..=lng_max).contains(&lng) {
                    set(flags::SINGAPORE_COORDINATES);
                }
            }
        }

        set(quality_tier(assessment.quality_score));

        for rule in SOURCE_RULES {
            if (rule.applies)(&record.metadata) {
                set(rule.flag);
            }
        }

        out
    }
}
