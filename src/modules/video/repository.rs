//! Job record store backed by Redis hashes.
//!
//! One hash per job under `clipo:videos:{id}`. Partial updates go through a
//! single `HSET`, which Redis applies atomically, so concurrent writers can
//! never interleave within one update. The pipeline is the only writer for
//! a given job after ingress.

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;
use uuid::Uuid;

use super::model::{NewVideoRecord, VideoRecord, VideoStatus, fields};
use crate::infrastructure::redis::client::RedisService;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    DuplicateKey,
    #[error("record not found")]
    NotFound,
    #[error("store backend error: {0}")]
    Backend(#[from] redis::RedisError),
}

/// Store contract for job records: insert, partial-field merge, and point
/// lookup. Kept behind a trait so the pipeline can run against an
/// in-memory store in tests.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, record: &NewVideoRecord) -> Result<(), StoreError>;

    /// Merges only the given fields into the record. Fields not listed are
    /// left untouched.
    async fn update_fields(
        &self,
        id: Uuid,
        updates: &[(&'static str, String)],
    ) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<VideoRecord, StoreError>;
}

fn record_key(id: Uuid) -> String {
    format!("clipo:videos:{id}")
}

#[derive(Clone)]
pub struct RedisVideoRepository {
    redis: RedisService,
}

impl RedisVideoRepository {
    pub fn new(redis: RedisService) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl JobStore for RedisVideoRepository {
    async fn create(&self, record: &NewVideoRecord) -> Result<(), StoreError> {
        let mut conn = self.redis.get_conn().await?;
        let key = record_key(record.id);

        // HSETNX on the id field doubles as the uniqueness guard.
        let inserted: bool = conn
            .hset_nx(&key, fields::ID, record.id.to_string())
            .await?;
        if !inserted {
            return Err(StoreError::DuplicateKey);
        }

        let _: () = conn
            .hset_multiple(
                &key,
                &[
                    (fields::FILENAME, record.filename.clone()),
                    (fields::UPLOAD_TIME, record.upload_time.clone()),
                    (fields::STATUS, VideoStatus::Pending.as_str().to_string()),
                ],
            )
            .await?;

        Ok(())
    }

    async fn update_fields(
        &self,
        id: Uuid,
        updates: &[(&'static str, String)],
    ) -> Result<(), StoreError> {
        let mut conn = self.redis.get_conn().await?;
        let key = record_key(id);

        let exists: bool = conn.exists(&key).await?;
        if !exists {
            return Err(StoreError::NotFound);
        }

        let _: () = conn.hset_multiple(&key, updates).await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<VideoRecord, StoreError> {
        let mut conn = self.redis.get_conn().await?;

        let hash: std::collections::HashMap<String, String> =
            conn.hgetall(record_key(id)).await?;
        if hash.is_empty() {
            return Err(StoreError::NotFound);
        }

        Ok(VideoRecord::from_hash(hash))
    }
}
