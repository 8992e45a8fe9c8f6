use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::app::ports::{RecordSink, RejectionSink};
use crate::observability::metrics;
use crate::pipeline::processing::normalize::RawRecord;
use crate::pipeline::{PipelineCoordinator, RecordOutcome, RejectionReason};

/// Use case for running a batch of raw records through the pipeline and
/// routing each outcome to the record or rejection output
pub struct ProcessUseCase {
    coordinator: Arc<PipelineCoordinator>,
    records_output: Box<dyn RecordSink>,
    rejections_output: Box<dyn RejectionSink>,
    workers: usize,
}

impl ProcessUseCase {
    pub fn new(
        coordinator: Arc<PipelineCoordinator>,
        records_output: Box<dyn RecordSink>,
        rejections_output: Box<dyn RejectionSink>,
        workers: usize,
    ) -> Self {
        Self {
            coordinator,
            records_output,
            rejections_output,
            workers: workers.max(1),
        }
    }

    pub async fn process_batch(&self, raws: Vec<RawRecord>) -> Result<Vec<RecordOutcome>> {
        self.process_batch_at(raws, Utc::now()).await
    }

    /// Process a batch with ages measured against `now`
    pub async fn process_batch_at(&self, raws: Vec<RawRecord>, now: DateTime<Utc>) -> Result<Vec<RecordOutcome>> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("process_batch", run_id = %run_id, records = raws.len());
        self.run(raws, now).instrument(span).await
    }

    async fn run(&self, raws: Vec<RawRecord>, now: DateTime<Utc>) -> Result<Vec<RecordOutcome>> {
        let total = raws.len();
        info!("Processing {} raw records with {} workers", total, self.workers);

        let outcomes = Arc::clone(&self.coordinator)
            .process_batch_concurrent(raws, self.workers, now)
            .await
            .context("Pipeline run aborted")?;

        for outcome in &outcomes {
            match outcome {
                RecordOutcome::Accepted { record, .. } => {
                    self.records_output
                        .write_record(record)
                        .await
                        .with_context(|| format!("Failed to write record {}", record.id))?;
                }
                RecordOutcome::Rejected(rejection) => {
                    self.rejections_output
                        .write_rejection(rejection)
                        .await
                        .context("Failed to write rejection")?;
                }
            }
        }
        self.records_output.flush().await?;
        self.rejections_output.flush().await?;

        metrics::pipeline::batch_processed(total);
        let stats = Self::get_batch_stats(&outcomes);
        info!(
            total = stats.total_records,
            accepted = stats.accepted_count,
            rejected = stats.rejected_count,
            duplicates = stats.duplicate_count,
            avg_quality = stats.avg_quality_score,
            "Batch complete"
        );

        Ok(outcomes)
    }

    /// Summarize a batch's outcomes
    pub fn get_batch_stats(outcomes: &[RecordOutcome]) -> BatchStats {
        let mut stats = BatchStats::default();
        let mut score_sum = 0.0;

        for outcome in outcomes {
            stats.total_records += 1;
            match outcome {
                RecordOutcome::Accepted { record, duplicate_of } => {
                    stats.accepted_count += 1;
                    if duplicate_of.is_some() {
                        stats.duplicate_count += 1;
                    }

                    let score = record.quality_score;
                    score_sum += score;
                    stats.min_quality_score = Some(stats.min_quality_score.map_or(score, |m| m.min(score)));
                    stats.max_quality_score = Some(stats.max_quality_score.map_or(score, |m| m.max(score)));

                    for flag in &record.processing_flags {
                        *stats.flag_distribution.entry(flag.clone()).or_insert(0) += 1;
                    }
                }
                RecordOutcome::Rejected(rejection) => {
                    stats.rejected_count += 1;
                    match &rejection.reason {
                        RejectionReason::Normalization(_) => {
                            *stats.rejections_by_rule.entry("normalization".to_string()).or_insert(0) += 1;
                        }
                        RejectionReason::Validation(errors) => {
                            for error in errors {
                                *stats.rejections_by_rule.entry(error.rule.to_string()).or_insert(0) += 1;
                            }
                        }
                        RejectionReason::Duplicate(_) => {
                            stats.duplicate_count += 1;
                            *stats.rejections_by_rule.entry("duplicate".to_string()).or_insert(0) += 1;
                        }
                        RejectionReason::IdConflict(_) => {
                            *stats.rejections_by_rule.entry("id_conflict".to_string()).or_insert(0) += 1;
                        }
                    }
                }
            }
        }

        if stats.accepted_count > 0 {
            stats.avg_quality_score = score_sum / stats.accepted_count as f64;
        }
        stats
    }
}

/// Statistics for one processed batch
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchStats {
    pub total_records: usize,
    pub accepted_count: usize,
    pub rejected_count: usize,
    /// Annotated or excluded duplicates
    pub duplicate_count: usize,
    pub min_quality_score: Option<f64>,
    pub max_quality_score: Option<f64>,
    /// Over accepted records only
    pub avg_quality_score: f64,
    /// Keyed by validation rule, plus `normalization`, `duplicate` and `id_conflict`
    pub rejections_by_rule: BTreeMap<String, usize>,
    pub flag_distribution: BTreeMap<String, usize>,
}

impl BatchStats {
    /// Acceptance rate as a percentage
    pub fn acceptance_rate(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        self.accepted_count as f64 / self.total_records as f64 * 100.0
    }
}
