use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

use super::model::{VideoRecord, VideoStatus};

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub job_id: Uuid,
    pub status: VideoStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub job_id: String,
    pub status: VideoStatus,
}

/// Full record view for the metadata endpoint. Optional fields are only
/// serialized once the pipeline has written them; stored fields this
/// version of the code does not know about are flattened in untouched.
#[derive(Debug, Serialize, ToSchema)]
pub struct MetadataResponse {
    pub job_id: String,
    pub filename: String,
    pub upload_time: String,
    pub status: VideoStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

impl From<VideoRecord> for MetadataResponse {
    fn from(record: VideoRecord) -> Self {
        Self {
            job_id: record.id,
            filename: record.filename,
            upload_time: record.upload_time,
            status: record.status,
            duration: record.duration,
            thumbnail_url: record.thumbnail_url,
            cloud_url: record.cloud_url,
            error: record.error,
            extra: record.extra,
        }
    }
}
