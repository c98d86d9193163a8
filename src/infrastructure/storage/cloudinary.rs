//! Cloudinary upload API client.
//!
//! Videos go through the chunked upload protocol (`X-Unique-Upload-Id` +
//! `Content-Range`) so multi-gigabyte files never sit in memory whole;
//! thumbnails are small enough for a single streamed multipart request.
//! Authentication uses an unsigned upload preset configured on the
//! Cloudinary account.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use tracing::info;
use uuid::Uuid;

use crate::modules::video::pipeline::RemoteArchiver;

// Cloudinary requires chunks of at least 5MB; 6MB keeps chunk count low.
const CHUNK_SIZE: usize = 6_000_000;

#[derive(Debug, Deserialize)]
struct UploadResult {
    secure_url: Option<String>,
}

#[derive(Clone)]
pub struct CloudinaryService {
    http: reqwest::Client,
    cloud_name: String,
    upload_preset: String,
}

impl CloudinaryService {
    pub fn new(cloud_name: &str, upload_preset: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            cloud_name: cloud_name.to_string(),
            upload_preset: upload_preset.to_string(),
        }
    }

    fn upload_url(&self, resource_type: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/{}/upload",
            self.cloud_name, resource_type
        )
    }

    /// Chunked upload of a large file. Every request carries the same
    /// `X-Unique-Upload-Id`; the response to the final chunk holds the
    /// asset's `secure_url`.
    async fn upload_large(&self, path: &Path, resource_type: &str, public_id: &str) -> Result<String> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| anyhow!("cannot open {}: {}", path.display(), e))?;
        let total = file.metadata().await?.len();
        if total == 0 {
            return Err(anyhow!("refusing to upload empty file {}", path.display()));
        }

        let upload_id = Uuid::new_v4().as_simple().to_string();
        let url = self.upload_url(resource_type);
        let mut offset: u64 = 0;

        loop {
            let mut buf = vec![0u8; CHUNK_SIZE.min((total - offset) as usize)];
            file.read_exact(&mut buf).await?;
            let end = offset + buf.len() as u64 - 1;

            let form = Form::new()
                .text("upload_preset", self.upload_preset.clone())
                .text("public_id", public_id.to_string())
                .part("file", Part::bytes(buf).file_name("chunk"));

            let resp = self
                .http
                .post(&url)
                .header("X-Unique-Upload-Id", &upload_id)
                .header("Content-Range", format!("bytes {offset}-{end}/{total}"))
                .multipart(form)
                .send()
                .await
                .map_err(|e| anyhow!("request failed: {}", e))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(anyhow!("HTTP {}: {}", status, body));
            }

            offset = end + 1;
            if offset >= total {
                let result: UploadResult = resp
                    .json()
                    .await
                    .map_err(|e| anyhow!("unparseable upload response: {}", e))?;
                return result
                    .secure_url
                    .ok_or_else(|| anyhow!("upload response missing secure_url"));
            }
        }
    }

    async fn upload_simple(&self, path: &Path, resource_type: &str, public_id: &str) -> Result<String> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| anyhow!("cannot open {}: {}", path.display(), e))?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let form = Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .text("public_id", public_id.to_string())
            .part("file", Part::stream(body).file_name("file"));

        let resp = self
            .http
            .post(self.upload_url(resource_type))
            .multipart(form)
            .send()
            .await
            .map_err(|e| anyhow!("request failed: {}", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("HTTP {}: {}", status, body));
        }

        let result: UploadResult = resp
            .json()
            .await
            .map_err(|e| anyhow!("unparseable upload response: {}", e))?;
        result
            .secure_url
            .ok_or_else(|| anyhow!("upload response missing secure_url"))
    }
}

#[async_trait]
impl RemoteArchiver for CloudinaryService {
    async fn archive_video(&self, path: &Path, public_id: &str) -> Result<String> {
        info!("⬆️ Uploading video {} as {}", path.display(), public_id);
        self.upload_large(path, "video", public_id).await
    }

    async fn archive_image(&self, path: &Path, public_id: &str) -> Result<String> {
        info!("⬆️ Uploading image {} as {}", path.display(), public_id);
        self.upload_simple(path, "image", public_id).await
    }
}
