//! Content-fingerprint deduplication.
//!
//! The [`FingerprintIndex`] is the only state shared between records. Callers
//! own it and hand it to a [`Deduplicator`] explicitly, so separate runs never
//! see each other's fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::domain::{Source, UniversalRecord};
use crate::error::{DuplicateDetected, IdConflict, PipelineError};
use crate::observability::metrics;

/// Case-fold and collapse all whitespace runs to single spaces.
pub fn normalize_content(content: &str) -> String {
    content.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Stable SHA-256 hex fingerprint over the source tag and normalized content.
pub fn content_fingerprint(source: Source, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_content(content).as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether a record was the first to claim its fingerprint, and whether its id was free
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DedupVerdict {
    Unique { fingerprint: String },
    Duplicate(DuplicateDetected),
    IdConflict(IdConflict),
}

impl DedupVerdict {
    pub fn is_unique(&self) -> bool {
        matches!(self, DedupVerdict::Unique { .. })
    }

    pub fn fingerprint(&self) -> &str {
        match self {
            DedupVerdict::Unique { fingerprint } => fingerprint,
            DedupVerdict::Duplicate(dup) => &dup.fingerprint,
            DedupVerdict::IdConflict(conflict) => &conflict.fingerprint,
        }
    }
}

#[derive(Debug, Default)]
struct IndexState {
    /// (source, fingerprint) -> owning record id
    by_fingerprint: HashMap<(Source, String), String>,
    /// (source, id) -> fingerprint it owns
    by_id: HashMap<(Source, String), String>,
}

/// Fingerprint ownership for one processing run. Grows monotonically.
#[derive(Debug, Default)]
pub struct FingerprintIndex {
    state: Mutex<IndexState>,
}

impl FingerprintIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically check and claim a fingerprint for `id`.
    ///
    /// The whole read-check-insert happens under one lock, so among concurrent
    /// claimants of the same fingerprint exactly one sees `Unique`. The id is
    /// checked first: an id already claimed in its source is an `IdConflict`
    /// whatever the content. Content duplicates still reserve their id.
    pub fn claim(&self, source: Source, fingerprint: &str, id: &str) -> Result<DedupVerdict, PipelineError> {
        let mut state = self.state.lock().map_err(|_| PipelineError::IndexPoisoned)?;

        let id_key = (source, id.to_string());
        if state.by_id.contains_key(&id_key) {
            return Ok(DedupVerdict::IdConflict(IdConflict {
                id: id.to_string(),
                fingerprint: fingerprint.to_string(),
            }));
        }
        state.by_id.insert(id_key, fingerprint.to_string());

        let fp_key = (source, fingerprint.to_string());
        if let Some(owner) = state.by_fingerprint.get(&fp_key) {
            return Ok(DedupVerdict::Duplicate(DuplicateDetected {
                fingerprint: fingerprint.to_string(),
                original_id: owner.clone(),
            }));
        }

        state.by_fingerprint.insert(fp_key, id.to_string());
        Ok(DedupVerdict::Unique {
            fingerprint: fingerprint.to_string(),
        })
    }

    pub fn len(&self) -> Result<usize, PipelineError> {
        let state = self.state.lock().map_err(|_| PipelineError::IndexPoisoned)?;
        Ok(state.by_fingerprint.len())
    }

    pub fn is_empty(&self) -> Result<bool, PipelineError> {
        Ok(self.len()? == 0)
    }
}

/// Classifies validated records as unique or duplicate against a shared index
#[derive(Debug, Clone)]
pub struct Deduplicator {
    index: Arc<FingerprintIndex>,
}

impl Deduplicator {
    pub fn new(index: Arc<FingerprintIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &Arc<FingerprintIndex> {
        &self.index
    }

    /// Annotates, never drops: disposition of duplicates is the caller's policy.
    pub fn check(&self, record: &UniversalRecord) -> Result<DedupVerdict, PipelineError> {
        let fingerprint = content_fingerprint(record.source, &record.content);
        let verdict = self.index.claim(record.source, &fingerprint, &record.id)?;

        match &verdict {
            DedupVerdict::Duplicate(dup) => {
                debug!(id = %record.id, original_id = %dup.original_id, "duplicate content detected");
                metrics::dedupe::duplicate_detected(record.source.as_str());
            }
            DedupVerdict::IdConflict(_) => {
                debug!(id = %record.id, "record id already claimed in this source");
                metrics::dedupe::id_conflict(record.source.as_str());
            }
            DedupVerdict::Unique { .. } => {}
        }
        Ok(verdict)
    }
}
