use axum::http::StatusCode;
use bytes::Bytes;
use std::path::Path;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;
use uuid::Uuid;

use super::dto::{MetadataResponse, StatusResponse, UploadResponse};
use super::events::{JobPublisher, ProcessVideoJob};
use super::keys;
use super::model::{NewVideoRecord, VideoStatus};
use super::repository::{JobStore, StoreError};

const ALLOWED_EXTENSIONS: [&str; 3] = [".mp4", ".avi", ".mov"];

/// Client filenames must be plain names with an allowed extension. Path
/// separators are rejected outright; the saved name embeds the client's
/// filename and must stay inside the upload directory.
pub fn is_allowed_filename(filename: &str) -> bool {
    if filename.contains(['/', '\\']) {
        return false;
    }
    let lower = filename.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Invalid video file format")]
    InvalidFormat,
    #[error("Video not found")]
    NotFound,
    #[error("Failed to persist upload: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for VideoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => VideoError::NotFound,
            other => VideoError::Store(other),
        }
    }
}

impl VideoError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            VideoError::InvalidFormat => StatusCode::BAD_REQUEST,
            VideoError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct VideoService;

impl VideoService {
    /// Accepts an upload: validates the filename, persists the bytes
    /// locally, creates the pending record, and hands the job to the
    /// publisher. Returns as soon as the job is published; the pipeline
    /// runs on the worker. The record is created before the handoff, so a
    /// published job always has a pending record behind it.
    pub async fn ingest(
        store: &dyn JobStore,
        publisher: &dyn JobPublisher,
        upload_dir: &str,
        filename: String,
        data: Bytes,
    ) -> Result<UploadResponse, VideoError> {
        if !is_allowed_filename(&filename) {
            return Err(VideoError::InvalidFormat);
        }

        let video_id = Uuid::new_v4();
        let file_path = keys::upload_path(Path::new(upload_dir), video_id, &filename);
        tokio::fs::write(&file_path, &data).await?;

        let upload_time = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| VideoError::Internal(e.into()))?;

        store
            .create(&NewVideoRecord {
                id: video_id,
                filename: filename.clone(),
                upload_time,
            })
            .await?;

        publisher
            .publish_job(&ProcessVideoJob {
                video_id,
                file_path,
                filename,
            })
            .await?;

        info!("Accepted upload {} ({} bytes)", video_id, data.len());

        Ok(UploadResponse {
            job_id: video_id,
            status: VideoStatus::Pending,
        })
    }

    pub async fn status(store: &dyn JobStore, id: Uuid) -> Result<StatusResponse, VideoError> {
        let record = store.get(id).await?;
        Ok(StatusResponse {
            job_id: record.id,
            status: record.status,
        })
    }

    pub async fn metadata(store: &dyn JobStore, id: Uuid) -> Result<MetadataResponse, VideoError> {
        let record = store.get(id).await?;
        Ok(MetadataResponse::from(record))
    }
}
