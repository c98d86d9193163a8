use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Message published by the upload handler and consumed by the processing
/// worker. All mutable job state lives in the store, so the worker only
/// needs the identifiers and the local file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessVideoJob {
    pub video_id: Uuid,
    pub file_path: PathBuf,
    pub filename: String,
}

/// Handoff from ingress to the detached worker. Production: RabbitMQ.
#[async_trait]
pub trait JobPublisher: Send + Sync {
    async fn publish_job(&self, job: &ProcessVideoJob) -> anyhow::Result<()>;
}
