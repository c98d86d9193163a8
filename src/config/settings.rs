use serde::Deserialize;

use crate::config::env::{self, EnvKey};

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub redis_url: String,
    pub amqp_url: String,
    pub upload_dir: String,
    pub thumbnail_dir: String,
    pub cloudinary_cloud_name: String,
    pub cloudinary_upload_preset: String,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            redis_url: env::get_or(EnvKey::RedisUrl, "redis://localhost:6379/0"),
            amqp_url: env::get_or(EnvKey::AmqpUrl, "amqp://localhost:5672"),
            upload_dir: env::get_or(EnvKey::UploadDir, "uploads"),
            thumbnail_dir: env::get_or(EnvKey::ThumbnailDir, "thumbnails"),
            cloudinary_cloud_name: env::get(EnvKey::CloudinaryCloudName)?,
            cloudinary_upload_preset: env::get(EnvKey::CloudinaryUploadPreset)?,
        })
    }
}
