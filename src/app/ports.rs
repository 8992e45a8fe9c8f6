use async_trait::async_trait;

use crate::domain::UniversalRecord;
use crate::pipeline::Rejection;

/// Destination for accepted records
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn write_record(&self, record: &UniversalRecord) -> anyhow::Result<()>;
    async fn flush(&self) -> anyhow::Result<()>;
}

/// Destination for the rejection report
#[async_trait]
pub trait RejectionSink: Send + Sync {
    async fn write_rejection(&self, rejection: &Rejection) -> anyhow::Result<()>;
    async fn flush(&self) -> anyhow::Result<()>;
}
