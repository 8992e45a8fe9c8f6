use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;

use propinsight_pipeline::constants::flags;
use propinsight_pipeline::domain::{Source, Timestamp};
use propinsight_pipeline::error::ValidationRule;
use propinsight_pipeline::pipeline::processing::dedupe::FingerprintIndex;
use propinsight_pipeline::pipeline::processing::normalize::RawRecord;
use propinsight_pipeline::pipeline::{DuplicatePolicy, PipelineCoordinator, RecordOutcome, RejectionReason};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 9, 30, 0).unwrap()
}

fn coordinator() -> PipelineCoordinator {
    PipelineCoordinator::with_defaults(Arc::new(FingerprintIndex::new()), Timestamp::from_datetime(now()))
}

fn long_announcement() -> String {
    "The Housing and Development Board will launch new flats across several estates this year. ".repeat(15)
}

#[test]
fn government_release_scores_0_925() {
    let raw = RawRecord::new(
        "government",
        json!({
            "id": "mnd-2025-001",
            "url": "https://www.mnd.gov.sg/newsroom/press-releases/view/mnd-2025-001",
            "title": "Upcoming BTO supply",
            "content": long_announcement(),
            "scraped_at": now().to_rfc3339(),
            "source_agency": "Ministry of National Development",
            "sentiment": {"score": 0.4, "confidence": 0.9, "label": "positive"},
            "location": {"mentioned_areas": ["Singapore"], "property_types": [], "coordinates": null}
        }),
    );

    let outcome = coordinator().process_record_at(&raw, now()).unwrap();
    let record = outcome.accepted_record().expect("record accepted");

    assert!((record.quality_score - 0.925).abs() < 1e-9, "got {}", record.quality_score);
    for flag in [
        flags::DUPLICATE_CHECK_PASSED,
        flags::CONTENT_FILTERED,
        flags::SUFFICIENT_LENGTH,
        flags::SENTIMENT_ANALYZED,
        flags::LOCATION_EXTRACTED,
        flags::HIGH_SENTIMENT_CONFIDENCE,
        flags::HIGH_QUALITY,
        flags::OFFICIAL_SOURCE,
    ] {
        assert!(record.processing_flags.contains(flag), "missing {}", flag);
    }
}

#[test]
fn ten_character_content_is_rejected_for_min_length() {
    let raw = RawRecord::new(
        "hardwarezone",
        json!({
            "id": "hwz-77",
            "post_url": "https://forums.hardwarezone.com.sg/threads/77/post-1",
            "thread_title": "Punggol BTO",
            "post_content": "0123456789",
            "post_number": 1,
            "sentiment_score": 0.2,
            "sentiment_confidence": 0.6
        }),
    );

    let outcome = coordinator().process_record_at(&raw, now()).unwrap();
    match &outcome.rejection().expect("rejected").reason {
        RejectionReason::Validation(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].rule, ValidationRule::MinLength);
            assert_eq!(errors[0].field, "content");
        }
        other => panic!("unexpected reason {:?}", other),
    }
}

#[test]
fn explicit_rating_of_six_is_rejected_even_with_valid_inferred() {
    let raw = RawRecord::new(
        "propertyguru",
        json!({
            "id": "pg-555",
            "url": "https://www.propertyguru.com.sg/condo-reviews/555",
            "content": "Great facilities and the MRT is a short walk away from the lobby.",
            "rating": {"explicit": 6.0, "inferred": 4.0, "confidence": "high", "method": "explicit"}
        }),
    );

    let outcome = coordinator().process_record_at(&raw, now()).unwrap();
    match &outcome.rejection().expect("rejected").reason {
        RejectionReason::Validation(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "rating.explicit");
            assert_eq!(errors[0].rule, ValidationRule::Range);
        }
        other => panic!("unexpected reason {:?}", other),
    }
}

#[test]
fn every_violation_is_reported_together() {
    let raw = RawRecord::new(
        "reddit",
        json!({
            "id": "r-bad",
            "url": "",
            "selftext": "short",
            "sentiment": {"score": 1.5, "confidence": 0.5, "label": "positive"},
            "scraped_at": "last tuesday"
        }),
    );

    let outcome = coordinator().process_record_at(&raw, now()).unwrap();
    let RejectionReason::Validation(errors) = &outcome.rejection().unwrap().reason else {
        panic!("expected validation rejection");
    };
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["url", "content", "sentiment.score", "scraped_at"]);
}

#[test]
fn unknown_source_is_rejected_at_normalization() {
    let raw = RawRecord::new("edgeprop", json!({"id": "e1", "content": "content that is long enough to pass"}));
    let outcome = coordinator().process_record_at(&raw, now()).unwrap();
    assert!(matches!(
        outcome.rejection().unwrap().reason,
        RejectionReason::Normalization(_)
    ));
}

#[test]
fn first_seen_wins_and_later_copies_are_annotated() {
    let c = coordinator();
    let content = "Anyone staying at Tampines GreenVines? How is the noise from the expressway?";
    let outcomes: Vec<RecordOutcome> = ["a", "b", "c"]
        .iter()
        .map(|id| {
            let raw = RawRecord::new(
                "reddit",
                json!({"id": id, "url": format!("https://reddit.com/{}", id), "selftext": content}),
            );
            c.process_record_at(&raw, now()).unwrap()
        })
        .collect();

    assert!(outcomes[0].accepted_record().unwrap().processing_flags.contains(flags::DUPLICATE_CHECK_PASSED));
    for outcome in &outcomes[1..] {
        let RecordOutcome::Accepted { record, duplicate_of } = outcome else {
            panic!("duplicates are annotated, not rejected");
        };
        assert_eq!(duplicate_of.as_ref().unwrap().original_id, "a");
        assert!(record.processing_flags.contains(flags::POTENTIAL_DUPLICATE));
    }
}

#[test]
fn same_content_from_different_sources_is_not_a_duplicate() {
    let c = coordinator();
    let content = "Bidadari estate has good connectivity to the city and nearby schools.";
    let reddit = RawRecord::new("reddit", json!({"id": "x", "url": "https://reddit.com/x", "selftext": content}));
    let hwz = RawRecord::new(
        "hardwarezone",
        json!({"id": "x", "post_url": "https://forums.hardwarezone.com.sg/x", "post_content": content}),
    );

    for raw in [reddit, hwz] {
        let outcome = c.process_record_at(&raw, now()).unwrap();
        assert!(matches!(outcome, RecordOutcome::Accepted { duplicate_of: None, .. }));
    }
    assert_eq!(c.index().len().unwrap(), 2);
}

#[test]
fn exclude_policy_rejects_duplicates() {
    let c = coordinator().with_duplicate_policy(DuplicatePolicy::Exclude);
    let content = "Looking for advice on resale HDB valuation in Yishun please.";
    for id in ["p", "q"] {
        let raw = RawRecord::new("reddit", json!({"id": id, "url": "https://reddit.com", "selftext": content}));
        let outcome = c.process_record_at(&raw, now()).unwrap();
        assert_eq!(outcome.is_accepted(), id == "p");
    }
}

#[test]
fn reused_id_is_rejected_so_accepted_ids_stay_unique() {
    for policy in [DuplicatePolicy::Annotate, DuplicatePolicy::Exclude] {
        let c = coordinator().with_duplicate_policy(policy);
        let raws = [
            ("same", "Original question about Sengkang executive condos"),
            ("same", "Edited question about Sengkang executive condos"),
            ("same", "Original question about Sengkang executive condos"),
            ("other", "Original question about Sengkang executive condos"),
        ];

        let mut accepted_ids = Vec::new();
        for (id, content) in raws {
            let raw = RawRecord::new(
                "reddit",
                json!({"id": id, "url": format!("https://reddit.com/{}", id), "selftext": content}),
            );
            match c.process_record_at(&raw, now()).unwrap() {
                RecordOutcome::Accepted { record, .. } => accepted_ids.push(record.id),
                RecordOutcome::Rejected(rejection) => {
                    if rejection.id.as_deref() == Some("same") {
                        assert!(matches!(rejection.reason, RejectionReason::IdConflict(_)));
                    }
                }
            }
        }

        let expected: Vec<&str> = match policy {
            DuplicatePolicy::Annotate => vec!["same", "other"],
            DuplicatePolicy::Exclude => vec!["same"],
        };
        assert_eq!(accepted_ids, expected);
    }
}

#[test]
fn upstream_flags_cannot_claim_what_the_record_lacks() {
    let raw = RawRecord::new(
        "propertyguru",
        json!({
            "id": "pg-anon",
            "url": "https://www.propertyguru.com.sg/property-reviews/anon",
            "content": "Unit was fine overall but management was slow to reply.",
            "reviewer_profile": "anonymous",
            "processing_flags": [
                "verified_review",
                "sentiment_analyzed",
                "high_sentiment_confidence",
                "location_extracted",
                "explicit_rating_available",
                "singapore_coordinates",
                "scraper_v2"
            ]
        }),
    );

    let outcome = coordinator().process_record_at(&raw, now()).unwrap();
    let record = outcome.accepted_record().expect("record accepted");
    assert!(record.sentiment.is_none() && record.rating.is_none() && record.location.is_none());
    for flag in [
        flags::VERIFIED_REVIEW,
        flags::SENTIMENT_ANALYZED,
        flags::HIGH_SENTIMENT_CONFIDENCE,
        flags::LOCATION_EXTRACTED,
        flags::EXPLICIT_RATING_AVAILABLE,
        flags::SINGAPORE_COORDINATES,
    ] {
        assert!(!record.processing_flags.contains(flag), "kept upstream {}", flag);
    }
    assert!(record.processing_flags.contains("scraper_v2"));
}

#[test]
fn url_without_host_is_rejected_for_format() {
    let raw = RawRecord::new(
        "reddit",
        json!({"id": "rel", "permalink": "/r/singapore/comments/rel/", "selftext": "Permalink only, no absolute URL here"}),
    );
    let outcome = coordinator().process_record_at(&raw, now()).unwrap();
    let RejectionReason::Validation(errors) = &outcome.rejection().expect("rejected").reason else {
        panic!("expected validation rejection");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "url");
    assert_eq!(errors[0].rule, ValidationRule::Format);
}

#[test]
fn planning_area_and_language_flags() {
    let raw = RawRecord::new(
        "hardwarezone",
        json!({
            "id": "hwz-9",
            "post_url": "https://forums.hardwarezone.com.sg/threads/9/post-4",
            "post_content": "Wah Toa Payoh resale sibei ex sia, cannot tahan",
            "post_number": 4,
            "location": {"mentioned_areas": ["Toa Payoh"], "property_types": ["HDB"], "coordinates": null}
        }),
    );
    let record = coordinator().process_record_at(&raw, now()).unwrap().accepted_record().cloned().unwrap();
    assert!(record.processing_flags.contains(flags::SINGAPORE_LOCATION));
    assert!(record.processing_flags.contains(flags::NON_STANDARD_ENGLISH));
    assert!(!record.processing_flags.contains(flags::ENGLISH_CONTENT));
}

#[test]
fn old_publication_date_lowers_temporal_score() {
    let published = now() - Duration::days(400);
    let raw = RawRecord::new(
        "propertyguru",
        json!({
            "id": "pg-old",
            "url": "https://www.propertyguru.com.sg/reviews/old",
            "content": "Solid developer, but the unit layout wastes a lot of space in the corridor.",
            "date_posted": published.to_rfc3339(),
            "reviewer_profile": "verified_resident",
            "rating": 4,
            "rating_confidence": "explicit"
        }),
    );

    let outcome = coordinator().process_record_at(&raw, now()).unwrap();
    let record = outcome.accepted_record().unwrap();
    // length 0.5, verified review 0.9, no sentiment, no location, 13 months old 0.6
    let expected = 0.2 * 0.5 + 0.3 * 0.9 + 0.15 * 0.6;
    assert!((record.quality_score - expected).abs() < 1e-9, "got {}", record.quality_score);
    assert_eq!(record.source, Source::PropertyGuru);
    assert!(record.processing_flags.contains(flags::EXPLICIT_RATING_AVAILABLE));
    assert!(record.processing_flags.contains(flags::VERIFIED_REVIEW));
}

#[tokio::test]
async fn concurrent_batch_matches_sequential_outcomes() {
    let raws: Vec<RawRecord> = (0..50)
        .map(|i| {
            let content = if i % 5 == 0 {
                "Shared post about the Lentor condo cluster launch".to_string()
            } else {
                format!("Unique post number {} about the Lentor condo cluster", i)
            };
            RawRecord::new("reddit", json!({"id": format!("n{}", i), "url": "https://reddit.com", "selftext": content}))
        })
        .collect();

    let sequential = coordinator().process_batch_at(&raws, now()).unwrap();
    let concurrent = Arc::new(coordinator())
        .process_batch_concurrent(raws, 6, now())
        .await
        .unwrap();

    assert_eq!(sequential.len(), concurrent.len());
    let ids = |outcomes: &[RecordOutcome]| -> Vec<String> {
        outcomes.iter().map(|o| o.accepted_record().unwrap().id.clone()).collect()
    };
    assert_eq!(ids(&sequential), ids(&concurrent));

    let dupes = |outcomes: &[RecordOutcome]| {
        outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::Accepted { duplicate_of: Some(_), .. }))
            .count()
    };
    assert_eq!(dupes(&sequential), 9);
    assert_eq!(dupes(&concurrent), 9);
}
