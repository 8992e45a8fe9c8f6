/// Source tag constants to ensure consistency across the codebase.
/// These are the values scrapers put in `source` and the wire format carries.
pub const REDDIT: &str = "reddit";
pub const GOVERNMENT: &str = "government";
pub const PROPERTYGURU: &str = "propertyguru";
pub const HARDWAREZONE: &str = "hardwarezone";

// Validation thresholds
pub const MIN_CONTENT_CHARS: usize = 20;
pub const SENTIMENT_SCORE_RANGE: (f64, f64) = (-1.0, 1.0);
pub const SENTIMENT_CONFIDENCE_RANGE: (f64, f64) = (0.0, 1.0);
pub const RATING_RANGE: (f64, f64) = (1.0, 5.0);
pub const UPVOTE_RATIO_RANGE: (f64, f64) = (0.0, 1.0);

// Flag derivation thresholds
pub const SUFFICIENT_LENGTH_CHARS: usize = 50;
pub const REDDIT_HIGH_ENGAGEMENT_SCORE: i64 = 100;
pub const VERIFIED_RESIDENT_PROFILE: &str = "verified_resident";
pub const HIGH_QUALITY_THRESHOLD: f64 = 0.8;
pub const MEDIUM_QUALITY_THRESHOLD: f64 = 0.6;
/// Distinct function words needed before content counts as English
pub const ENGLISH_FUNCTION_WORD_MIN: usize = 2;

/// The country-level area that does not count as a specific location
pub const COUNTRY_AREA: &str = "Singapore";

/// Processing flag names
pub mod flags {
    pub const DUPLICATE_CHECK_PASSED: &str = "duplicate_check_passed";
    pub const POTENTIAL_DUPLICATE: &str = "potential_duplicate";
    pub const CONTENT_FILTERED: &str = "content_filtered";
    pub const POTENTIAL_SPAM: &str = "potential_spam";
    pub const SUFFICIENT_LENGTH: &str = "sufficient_length";
    pub const SENTIMENT_ANALYZED: &str = "sentiment_analyzed";
    pub const RATING_INFERRED: &str = "rating_inferred";
    pub const EXPLICIT_RATING_AVAILABLE: &str = "explicit_rating_available";
    pub const LOCATION_EXTRACTED: &str = "location_extracted";
    pub const PROPERTY_TYPE_IDENTIFIED: &str = "property_type_identified";
    pub const SINGAPORE_COORDINATES: &str = "singapore_coordinates";
    pub const SINGAPORE_PROPERTY_KEYWORDS: &str = "singapore_property_keywords";
    pub const HIGH_SENTIMENT_CONFIDENCE: &str = "high_sentiment_confidence";
    pub const MEDIUM_SENTIMENT_CONFIDENCE: &str = "medium_sentiment_confidence";
    pub const LOW_SENTIMENT_CONFIDENCE: &str = "low_sentiment_confidence";
    pub const HIGH_QUALITY: &str = "high_quality";
    pub const MEDIUM_QUALITY: &str = "medium_quality";
    pub const LOW_QUALITY: &str = "low_quality";
    pub const SINGAPORE_LOCATION: &str = "singapore_location";
    pub const ENGLISH_CONTENT: &str = "english_content";
    pub const NON_STANDARD_ENGLISH: &str = "non_standard_english";

    // Source-specific
    pub const HIGH_ENGAGEMENT: &str = "high_engagement";
    pub const VERIFIED_REVIEW: &str = "verified_review";
    pub const OFFICIAL_SOURCE: &str = "official_source";
    pub const THREAD_STARTER: &str = "thread_starter";

    /// Every flag the deriver owns. Upstream copies of these are discarded.
    pub const ALL: &[&str] = &[
        DUPLICATE_CHECK_PASSED,
        POTENTIAL_DUPLICATE,
        CONTENT_FILTERED,
        POTENTIAL_SPAM,
        SUFFICIENT_LENGTH,
        SENTIMENT_ANALYZED,
        RATING_INFERRED,
        EXPLICIT_RATING_AVAILABLE,
        LOCATION_EXTRACTED,
        PROPERTY_TYPE_IDENTIFIED,
        SINGAPORE_COORDINATES,
        SINGAPORE_PROPERTY_KEYWORDS,
        HIGH_SENTIMENT_CONFIDENCE,
        MEDIUM_SENTIMENT_CONFIDENCE,
        LOW_SENTIMENT_CONFIDENCE,
        HIGH_QUALITY,
        MEDIUM_QUALITY,
        LOW_QUALITY,
        SINGAPORE_LOCATION,
        ENGLISH_CONTENT,
        NON_STANDARD_ENGLISH,
        HIGH_ENGAGEMENT,
        VERIFIED_REVIEW,
        OFFICIAL_SOURCE,
        THREAD_STARTER,
    ];
}

/// Phrases that mark promotional content
pub const SPAM_PATTERNS: &[&str] = &[
    "click here",
    "buy now",
    "limited time",
    "act fast",
    "guaranteed",
    "risk free",
    "no obligation",
];

/// Singapore property vocabulary: housing types, planning areas, and trade terms
pub const PROPERTY_KEYWORDS: &[&str] = &[
    "hdb", "condo", "landed", "bto", "resale", "private", "ec", "dbss",
    "orchard", "marina bay", "sentosa", "punggol", "sengkang", "tampines",
    "jurong", "woodlands", "yishun", "ang mo kio", "bishan", "toa payoh",
    "queenstown", "bukit timah", "novena", "dhoby ghaut", "raffles place",
    "property", "housing", "real estate", "mortgage", "cpf", "downpayment",
    "valuation", "psf", "sqft", "bedroom", "bathroom", "balcony", "parking",
];

/// Planning areas recognised as Singapore locations
pub const SINGAPORE_PLANNING_AREAS: &[&str] = &[
    "orchard", "marina bay", "sentosa", "punggol", "sengkang", "tampines",
    "jurong", "woodlands", "yishun", "ang mo kio", "bishan", "toa payoh",
    "queenstown", "bukit timah", "novena", "dhoby ghaut", "raffles place",
];

/// Common English function words used to tell English posts from Singlish or other text
pub const ENGLISH_FUNCTION_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// Rough Singapore bounding box: (lat_min, lat_max, lng_min, lng_max)
pub const SINGAPORE_BOUNDS: (f64, f64, f64, f64) = (1.0, 1.6, 103.0, 104.5);
