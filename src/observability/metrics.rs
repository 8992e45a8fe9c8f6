//! Metrics for the PropInsight pipeline
//!
//! Thin wrappers over the `metrics` facade using Prometheus naming
//! conventions. Nothing is exported until [`init`] installs a recorder;
//! before that every call is a no-op.

use std::fmt;
use std::net::SocketAddr;
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Every metric the pipeline records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Normalize
    NormalizeRecordsNormalized,
    NormalizeRecordsFailed,

    // Validate
    ValidateRuleViolations,

    // Dedupe
    DedupeDuplicatesDetected,
    DedupeIdConflicts,

    // Quality gate
    QualityGateQualityScore,

    // Pipeline
    PipelineRecordsAccepted,
    PipelineRecordsRejected,
    PipelineBatchesProcessed,
    PipelineBatchSize,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::NormalizeRecordsNormalized => "propinsight_normalize_records_normalized_total",
            MetricName::NormalizeRecordsFailed => "propinsight_normalize_records_failed_total",
            MetricName::ValidateRuleViolations => "propinsight_validate_rule_violations_total",
            MetricName::DedupeDuplicatesDetected => "propinsight_dedupe_duplicates_detected_total",
            MetricName::DedupeIdConflicts => "propinsight_dedupe_id_conflicts_total",
            MetricName::QualityGateQualityScore => "propinsight_quality_gate_quality_score",
            MetricName::PipelineRecordsAccepted => "propinsight_pipeline_records_accepted_total",
            MetricName::PipelineRecordsRejected => "propinsight_pipeline_records_rejected_total",
            MetricName::PipelineBatchesProcessed => "propinsight_pipeline_batches_processed_total",
            MetricName::PipelineBatchSize => "propinsight_pipeline_batch_size",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            NormalizeRecordsNormalized,
            NormalizeRecordsFailed,
            ValidateRuleViolations,
            DedupeDuplicatesDetected,
            DedupeIdConflicts,
            QualityGateQualityScore,
            PipelineRecordsAccepted,
            PipelineRecordsRejected,
            PipelineBatchesProcessed,
            PipelineBatchSize,
        ]
        .into_iter()
    }

    /// (stage, description)
    pub fn metadata(&self) -> (&'static str, &'static str) {
        match self {
            MetricName::NormalizeRecordsNormalized => ("normalize", "Raw records normalized, by source"),
            MetricName::NormalizeRecordsFailed => ("normalize", "Raw records that failed normalization, by source"),
            MetricName::ValidateRuleViolations => ("validate", "Validation failures, by rule"),
            MetricName::DedupeDuplicatesDetected => ("dedupe", "Records whose content was already seen, by source"),
            MetricName::DedupeIdConflicts => ("dedupe", "Records reusing an id already claimed, by source"),
            MetricName::QualityGateQualityScore => ("quality_gate", "Quality score distribution"),
            MetricName::PipelineRecordsAccepted => ("pipeline", "Records accepted, by source"),
            MetricName::PipelineRecordsRejected => ("pipeline", "Records rejected, by stage"),
            MetricName::PipelineBatchesProcessed => ("pipeline", "Batches processed"),
            MetricName::PipelineBatchSize => ("pipeline", "Records per batch"),
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder.
///
/// With a port, metrics are served over HTTP at `0.0.0.0:<port>/metrics`
/// (must be called inside a Tokio runtime). Without one, they are only
/// kept in memory for [`render`].
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    match port {
        Some(port) => {
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()
                .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))?;
            info!("Metrics exporter listening on {}", addr);
        }
        None => {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
            METRICS_HANDLE.set(handle).ok();
            info!("Metrics recorder installed (no exporter)");
        }
    }

    for metric in MetricName::all_metrics() {
        let (_, description) = metric.metadata();
        match metric {
            MetricName::QualityGateQualityScore | MetricName::PipelineBatchSize => {
                ::metrics::describe_histogram!(metric.as_str(), description)
            }
            _ => ::metrics::describe_counter!(metric.as_str(), description),
        }
    }
    Ok(())
}

/// Current metrics in Prometheus text format, when recording in memory.
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

// ============================================================================
// Normalize Metrics
// ============================================================================

pub mod normalize {
    use super::MetricName;

    pub fn record_normalized(source: &str) {
        ::metrics::counter!(MetricName::NormalizeRecordsNormalized.as_str(), "source" => source.to_string()).increment(1);
    }

    pub fn record_failed(source: &str) {
        ::metrics::counter!(MetricName::NormalizeRecordsFailed.as_str(), "source" => source.to_string()).increment(1);
    }
}

// ============================================================================
// Validate Metrics
// ============================================================================

pub mod validate {
    use super::MetricName;

    /// One violated rule; a record failing three rules counts three times
    pub fn rule_violated(rule: &str) {
        ::metrics::counter!(MetricName::ValidateRuleViolations.as_str(), "rule" => rule.to_string()).increment(1);
    }
}

// ============================================================================
// Dedupe Metrics
// ============================================================================

pub mod dedupe {
    use super::MetricName;

    pub fn duplicate_detected(source: &str) {
        ::metrics::counter!(MetricName::DedupeDuplicatesDetected.as_str(), "source" => source.to_string()).increment(1);
    }

    pub fn id_conflict(source: &str) {
        ::metrics::counter!(MetricName::DedupeIdConflicts.as_str(), "source" => source.to_string()).increment(1);
    }
}

// ============================================================================
// Quality Gate Metrics
// ============================================================================

pub mod quality_gate {
    use super::MetricName;

    pub fn quality_score_recorded(score: f64) {
        ::metrics::histogram!(MetricName::QualityGateQualityScore.as_str()).record(score);
    }
}

// ============================================================================
// Pipeline Metrics
// ============================================================================

pub mod pipeline {
    use super::MetricName;

    pub fn record_accepted(source: &str) {
        ::metrics::counter!(MetricName::PipelineRecordsAccepted.as_str(), "source" => source.to_string()).increment(1);
    }

    pub fn record_rejected(stage: &str) {
        ::metrics::counter!(MetricName::PipelineRecordsRejected.as_str(), "stage" => stage.to_string()).increment(1);
    }

    pub fn batch_processed(total_records: usize) {
        ::metrics::counter!(MetricName::PipelineBatchesProcessed.as_str()).increment(1);
        ::metrics::histogram!(MetricName::PipelineBatchSize.as_str()).record(total_records as f64);
    }
}
