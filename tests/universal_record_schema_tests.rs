use chrono::{TimeZone, Utc};
use jsonschema::JSONSchema;
use serde_json::{json, Value};
use std::sync::Arc;

use propinsight_pipeline::domain::Timestamp;
use propinsight_pipeline::pipeline::processing::dedupe::FingerprintIndex;
use propinsight_pipeline::pipeline::processing::normalize::RawRecord;
use propinsight_pipeline::pipeline::storage::{decode_line, encode_line};
use propinsight_pipeline::pipeline::PipelineCoordinator;

fn compiled_schema() -> JSONSchema {
    let schema = include_str!("../schemas/universal_record.v1.json");
    let schema_json: Value = serde_json::from_str(schema).unwrap();
    let schema_static: &'static Value = Box::leak(Box::new(schema_json));
    JSONSchema::options().compile(schema_static).unwrap()
}

fn example() -> Value {
    serde_json::from_str(include_str!("resources/universal_record_propertyguru.json")).unwrap()
}

#[test]
fn example_record_is_valid() {
    assert!(compiled_schema().is_valid(&example()));
}

#[test]
fn example_record_decodes_into_universal_record() {
    let line = serde_json::to_string(&example()).unwrap();
    let record = decode_line(&line).unwrap();
    assert_eq!(record.id, "pg-rev-881");
    assert_eq!(record.processing_flags.len(), 13);
}

#[test]
fn out_of_range_explicit_rating_is_rejected() {
    let mut invalid = example();
    invalid["rating"]["explicit"] = json!(6.0);
    assert!(!compiled_schema().is_valid(&invalid));
}

#[test]
fn short_content_is_rejected() {
    let mut invalid = example();
    invalid["content"] = json!("0123456789");
    assert!(!compiled_schema().is_valid(&invalid));
}

#[test]
fn optional_sections_must_be_present_as_null() {
    let mut missing = example();
    missing.as_object_mut().unwrap().remove("sentiment");
    assert!(!compiled_schema().is_valid(&missing));

    let mut null = example();
    null["sentiment"] = Value::Null;
    assert!(compiled_schema().is_valid(&null));
}

#[test]
fn pipeline_output_conforms_to_schema() {
    let now = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
    let coordinator =
        PipelineCoordinator::with_defaults(Arc::new(FingerprintIndex::new()), Timestamp::from_datetime(now));
    let compiled = compiled_schema();

    let raws = vec![
        RawRecord::new(
            "reddit",
            json!({
                "id": "t3_abc",
                "permalink": "https://reddit.com/r/singapore/comments/abc/",
                "title": "BTO vs resale",
                "selftext": "Torn between a BTO in Tengah and a resale flat in Bukit Batok.",
                "subreddit": "singapore",
                "score": 240,
                "created_utc": 1754000000
            }),
        ),
        RawRecord::new(
            "hardwarezone",
            json!({
                "id": "hwz-9",
                "post_url": "https://forums.hardwarezone.com.sg/threads/9/post-1",
                "thread_title": "Condo price discussion",
                "post_content": "Prices in District 15 have gone up again this quarter, crazy.",
                "post_number": 1,
                "sentiment_score": -0.4,
                "sentiment_confidence": 0.7,
                "date_posted": "2025-07-01 10:00:00"
            }),
        ),
    ];

    for raw in &raws {
        let outcome = coordinator.process_record_at(raw, now).unwrap();
        let record = outcome.accepted_record().expect("accepted");
        let line = encode_line(record).unwrap();
        let value: Value = serde_json::from_str(&line).unwrap();
        let result = compiled.validate(&value);
        if let Err(errors) = result {
            let messages: Vec<String> = errors.map(|e| format!("{} at {}", e, e.instance_path)).collect();
            panic!("{} does not conform: {:?}", record.id, messages);
        }
    }
}
