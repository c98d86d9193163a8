//! Deterministic derivation of local paths and remote keys from a job id.
//!
//! Everything an upload leaves behind is keyed by its job id, so names can
//! never collide across jobs and any asset can be located from the id alone.

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Local path the raw upload is persisted to.
pub fn upload_path(upload_dir: &Path, id: Uuid, filename: &str) -> PathBuf {
    upload_dir.join(format!("{id}_{filename}"))
}

/// Local path the extracted still frame is written to.
pub fn thumbnail_path(thumbnail_dir: &Path, id: Uuid) -> PathBuf {
    thumbnail_dir.join(format!("{id}.jpg"))
}

/// Cloudinary public id for the archived video.
pub fn remote_video_key(id: Uuid) -> String {
    format!("clipo/videos/{id}")
}

/// Cloudinary public id for the archived thumbnail.
pub fn remote_thumbnail_key(id: Uuid) -> String {
    format!("clipo/thumbnails/{id}")
}
