// Record pipeline: processing stages, the coordinator that runs them, and storage

pub mod coordinator;
pub mod processing;
pub mod storage;

pub use coordinator::{DuplicatePolicy, PipelineCoordinator, RecordOutcome, Rejection, RejectionReason};
