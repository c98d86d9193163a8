use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Field names of a job record as stored in its Redis hash. The pipeline
/// and repository build their partial updates from these so the stored
/// layout is defined in exactly one place.
pub mod fields {
    pub const ID: &str = "id";
    pub const FILENAME: &str = "filename";
    pub const UPLOAD_TIME: &str = "upload_time";
    pub const STATUS: &str = "status";
    pub const ERROR: &str = "error";
    pub const DURATION: &str = "duration";
    pub const THUMBNAIL_URL: &str = "thumbnail_url";
    pub const CLOUD_URL: &str = "cloud_url";
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Pending,
    Done,
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Done => "done",
            VideoStatus::Failed => "failed",
        }
    }
}

impl From<&str> for VideoStatus {
    fn from(s: &str) -> Self {
        match s {
            "done" => VideoStatus::Done,
            "failed" => VideoStatus::Failed,
            _ => VideoStatus::Pending,
        }
    }
}

/// Initial record written at ingress, before the pipeline has run.
#[derive(Debug, Clone)]
pub struct NewVideoRecord {
    pub id: Uuid,
    pub filename: String,
    pub upload_time: String,
}

/// Full job record as read back from the store. Fields the current code
/// does not know about are kept in `extra` and passed through to clients
/// rather than dropped.
#[derive(Debug, Clone)]
pub struct VideoRecord {
    pub id: String,
    pub filename: String,
    pub upload_time: String,
    pub status: VideoStatus,
    pub error: Option<String>,
    pub duration: Option<String>,
    pub thumbnail_url: Option<String>,
    pub cloud_url: Option<String>,
    pub extra: HashMap<String, String>,
}

impl VideoRecord {
    pub fn from_hash(mut hash: HashMap<String, String>) -> Self {
        let status = hash
            .remove(fields::STATUS)
            .map(|s| VideoStatus::from(s.as_str()))
            .unwrap_or(VideoStatus::Pending);

        Self {
            id: hash.remove(fields::ID).unwrap_or_default(),
            filename: hash.remove(fields::FILENAME).unwrap_or_default(),
            upload_time: hash.remove(fields::UPLOAD_TIME).unwrap_or_default(),
            status,
            error: hash.remove(fields::ERROR),
            duration: hash.remove(fields::DURATION),
            thumbnail_url: hash.remove(fields::THUMBNAIL_URL),
            cloud_url: hash.remove(fields::CLOUD_URL),
            extra: hash,
        }
    }
}
