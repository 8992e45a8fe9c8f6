use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{Timestamp, UniversalRecord};
use crate::error::{DuplicateDetected, IdConflict, NormalizationError, PipelineError, ValidationError};
use crate::observability::metrics;
use crate::pipeline::processing::dedupe::{DedupVerdict, Deduplicator, FingerprintIndex};
use crate::pipeline::processing::flags::FlagDeriver;
use crate::pipeline::processing::normalize::{NormalizationRegistry, Normalizer, RawRecord};
use crate::pipeline::processing::quality_gate::{QualityScorer, WeightedQualityScorer};
use crate::pipeline::processing::validate::{SchemaValidator, ValidationVerdict, Validator};

/// What happens to a record whose content was already seen this run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Accept it, flagged `potential_duplicate`
    #[default]
    Annotate,
    /// Report it as rejected
    Exclude,
}

/// Why a record was rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "detail", rename_all = "snake_case")]
pub enum RejectionReason {
    Normalization(NormalizationError),
    Validation(Vec<ValidationError>),
    Duplicate(DuplicateDetected),
    /// Another record already claimed this `id` in the same source
    IdConflict(IdConflict),
}

/// A rejected record and the full list of reasons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub id: Option<String>,
    pub source: String,
    pub reason: RejectionReason,
    /// The normalized record, when normalization got that far
    pub record: Option<Box<UniversalRecord>>,
}

/// Terminal outcome for one input record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    Accepted {
        record: Box<UniversalRecord>,
        duplicate_of: Option<DuplicateDetected>,
    },
    Rejected(Rejection),
}

impl RecordOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RecordOutcome::Accepted { .. })
    }

    pub fn accepted_record(&self) -> Option<&UniversalRecord> {
        match self {
            RecordOutcome::Accepted { record, .. } => Some(record),
            RecordOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            RecordOutcome::Accepted { .. } => None,
            RecordOutcome::Rejected(rejection) => Some(rejection),
        }
    }
}

/// Runs Normalize → Validate → Deduplicate → Score → Derive flags for each record.
///
/// Records are independent apart from the shared [`FingerprintIndex`]; a
/// coordinator can be wrapped in an `Arc` and driven from many workers.
pub struct PipelineCoordinator {
    normalizer: Box<dyn Normalizer + Send + Sync>,
    validator: Box<dyn Validator + Send + Sync>,
    deduplicator: Deduplicator,
    scorer: Box<dyn QualityScorer + Send + Sync>,
    flag_deriver: FlagDeriver,
    duplicate_policy: DuplicatePolicy,
}

impl PipelineCoordinator {
    pub fn new(
        normalizer: Box<dyn Normalizer + Send + Sync>,
        validator: Box<dyn Validator + Send + Sync>,
        deduplicator: Deduplicator,
        scorer: Box<dyn QualityScorer + Send + Sync>,
    ) -> Self {
        Self {
            normalizer,
            validator,
            deduplicator,
            scorer,
            flag_deriver: FlagDeriver::new(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }

    /// Built-in stages over the given index, with missing `scraped_at` filled from `run_started_at`
    pub fn with_defaults(index: Arc<FingerprintIndex>, run_started_at: Timestamp) -> Self {
        Self::new(
            Box::new(NormalizationRegistry::with_run_timestamp(run_started_at)),
            Box::new(SchemaValidator::new()),
            Deduplicator::new(index),
            Box::new(WeightedQualityScorer::new()),
        )
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn index(&self) -> &Arc<FingerprintIndex> {
        self.deduplicator.index()
    }

    /// Normalization alone, for callers that attach sentiment before processing.
    pub fn normalize(&self, raw: &RawRecord) -> Result<UniversalRecord, NormalizationError> {
        self.normalizer.normalize(raw)
    }

    pub fn process_record(&self, raw: &RawRecord) -> Result<RecordOutcome, PipelineError> {
        self.process_record_at(raw, Utc::now())
    }

    /// Process one raw record, measuring ages against `now`.
    ///
    /// `Err` is reserved for systemic faults; per-record failures come back as
    /// [`RecordOutcome::Rejected`].
    pub fn process_record_at(&self, raw: &RawRecord, now: DateTime<Utc>) -> Result<RecordOutcome, PipelineError> {
        match self.normalizer.normalize(raw) {
            Ok(record) => self.process_normalized_at(record, now),
            Err(e) => {
                warn!(source = %raw.source, id = ?raw.raw_id(), error = %e, "record rejected during normalization");
                metrics::pipeline::record_rejected("normalization");
                Ok(RecordOutcome::Rejected(Rejection {
                    id: raw.raw_id(),
                    source: raw.source.clone(),
                    reason: RejectionReason::Normalization(e),
                    record: None,
                }))
            }
        }
    }

    /// Process an already-normalized record from validation onward.
    pub fn process_normalized_at(
        &self,
        mut record: UniversalRecord,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome, PipelineError> {
        // Never trust an upstream score
        record.quality_score = 0.0;

        if let ValidationVerdict::Invalid(errors) = self.validator.validate(&record) {
            warn!(
                source = %record.source,
                id = %record.id,
                reasons = ?errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
                "record failed validation"
            );
            for error in &errors {
                metrics::validate::rule_violated(error.rule.as_str());
            }
            metrics::pipeline::record_rejected("validation");
            return Ok(RecordOutcome::Rejected(Rejection {
                id: Some(record.id.clone()),
                source: record.source.to_string(),
                reason: RejectionReason::Validation(errors),
                record: Some(Box::new(record)),
            }));
        }

        let dedup = self.deduplicator.check(&record)?;
        if let DedupVerdict::IdConflict(conflict) = dedup {
            warn!(source = %record.source, id = %record.id, "record id already claimed in this source");
            metrics::pipeline::record_rejected("id_conflict");
            return Ok(RecordOutcome::Rejected(Rejection {
                id: Some(record.id.clone()),
                source: record.source.to_string(),
                reason: RejectionReason::IdConflict(conflict),
                record: Some(Box::new(record)),
            }));
        }

        let assessment = self.scorer.assess(&record, now);
        record.quality_score = assessment.quality_score;
        record.processing_flags = self.flag_deriver.derive(&record, &dedup, &assessment);
        metrics::quality_gate::quality_score_recorded(assessment.quality_score);

        match dedup {
            DedupVerdict::Duplicate(dup) if self.duplicate_policy == DuplicatePolicy::Exclude => {
                debug!(id = %record.id, original_id = %dup.original_id, "duplicate excluded by policy");
                metrics::pipeline::record_rejected("duplicate");
                Ok(RecordOutcome::Rejected(Rejection {
                    id: Some(record.id.clone()),
                    source: record.source.to_string(),
                    reason: RejectionReason::Duplicate(dup),
                    record: Some(Box::new(record)),
                }))
            }
            verdict => {
                debug!(id = %record.id, quality_score = record.quality_score, "record accepted");
                metrics::pipeline::record_accepted(record.source.as_str());
                let duplicate_of = match verdict {
                    DedupVerdict::Duplicate(dup) => Some(dup),
                    DedupVerdict::Unique { .. } | DedupVerdict::IdConflict(_) => None,
                };
                Ok(RecordOutcome::Accepted {
                    record: Box::new(record),
                    duplicate_of,
                })
            }
        }
    }

    /// Process a batch in order on the calling thread.
    pub fn process_batch_at(&self, raws: &[RawRecord], now: DateTime<Utc>) -> Result<Vec<RecordOutcome>, PipelineError> {
        raws.iter().map(|raw| self.process_record_at(raw, now)).collect()
    }

    /// Fan a batch out over `workers` blocking tasks sharing this coordinator's index.
    /// Outcomes are returned in input order.
    pub async fn process_batch_concurrent(
        self: Arc<Self>,
        raws: Vec<RawRecord>,
        workers: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<RecordOutcome>, PipelineError> {
        let total = raws.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let workers = workers.clamp(1, total);
        let chunk_size = total.div_ceil(workers);

        let mut indexed: Vec<(usize, RawRecord)> = raws.into_iter().enumerate().collect();
        let mut handles = Vec::with_capacity(workers);
        while !indexed.is_empty() {
            let rest = indexed.split_off(chunk_size.min(indexed.len()));
            let chunk = std::mem::replace(&mut indexed, rest);
            let coordinator = Arc::clone(&self);
            handles.push(tokio::task::spawn_blocking(move || {
                chunk
                    .into_iter()
                    .map(|(i, raw)| coordinator.process_record_at(&raw, now).map(|outcome| (i, outcome)))
                    .collect::<Result<Vec<_>, PipelineError>>()
            }));
        }

        let mut slots: Vec<Option<RecordOutcome>> = vec![None; total];
        for handle in handles {
            let results = handle
                .await
                .map_err(|e| PipelineError::WorkerFailed(e.to_string()))??;
            for (i, outcome) in results {
                slots[i] = Some(outcome);
            }
        }
        Ok(slots.into_iter().flatten().collect())
    }
}
