use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A raw record too malformed to build even the base universal schema.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum NormalizationError {
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Record declares source '{found}' but was submitted as '{declared}'")]
    SourceMismatch { declared: String, found: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Raw record is not a JSON object")]
    NotAnObject,
}

/// The invariant a [`ValidationError`] reports against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRule {
    Required,
    MinLength,
    Format,
    Range,
    Timestamp,
    MetadataShape,
}

impl ValidationRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationRule::Required => "required",
            ValidationRule::MinLength => "min_length",
            ValidationRule::Format => "format",
            ValidationRule::Range => "range",
            ValidationRule::Timestamp => "timestamp",
            ValidationRule::MetadataShape => "metadata_shape",
        }
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violated invariant, naming the field and the rule.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{field} violates {rule}: {detail}")]
pub struct ValidationError {
    pub field: String,
    pub rule: ValidationRule,
    pub detail: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, rule: ValidationRule, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule,
            detail: detail.into(),
        }
    }
}

/// Annotation attached by the deduplicator. Not a failure on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Duplicate of record '{original_id}' (fingerprint {fingerprint})")]
pub struct DuplicateDetected {
    pub fingerprint: String,
    pub original_id: String,
}

/// A second record claiming an `id` already taken within its source.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Record id '{id}' is already taken in this source")]
pub struct IdConflict {
    pub id: String,
    pub fingerprint: String,
}

/// Faults that halt a whole run rather than a single record.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Fingerprint index lock poisoned; index state can no longer be trusted")]
    IndexPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Worker task failed: {0}")]
    WorkerFailed(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
