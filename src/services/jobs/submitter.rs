//! Job submission interface used by the export pipeline.
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum JobSubmitError {
    #[error("invalid job definition: {0}")]
    InvalidDefinition(String),
    #[error("{0}")]
    Backend(String),
}

/// Everything a Spark export job needs from one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    pub request_id: Uuid,
    pub query: String,
    pub destination: String,
    pub region: String,
}

/// Submits export jobs to the big-data execution service.
///
/// Implementations are shared across requests (`Arc<dyn JobSubmitter>`) and
/// must not retry: one call here is one submission attempt.
#[async_trait]
pub trait JobSubmitter: Send + Sync + 'static {
    // Backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Returns the job run id assigned by the backend.
    async fn submit(&self, job: &ExportJob) -> Result<String, JobSubmitError>;
}
