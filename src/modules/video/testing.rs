//! In-memory fakes shared by the module's tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use super::events::{JobPublisher, ProcessVideoJob};
use super::model::{NewVideoRecord, VideoRecord, VideoStatus, fields};
use super::repository::{JobStore, StoreError};

/// Hash-per-record store with the same create and merge semantics as the
/// Redis-backed one.
#[derive(Default)]
pub struct MemoryJobStore {
    records: Mutex<HashMap<Uuid, HashMap<String, String>>>,
}

impl MemoryJobStore {
    pub fn record(&self, id: Uuid) -> VideoRecord {
        let records = self.records.lock().unwrap();
        VideoRecord::from_hash(records.get(&id).cloned().unwrap())
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, record: &NewVideoRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.id) {
            return Err(StoreError::DuplicateKey);
        }
        let mut hash = HashMap::new();
        hash.insert(fields::ID.to_string(), record.id.to_string());
        hash.insert(fields::FILENAME.to_string(), record.filename.clone());
        hash.insert(fields::UPLOAD_TIME.to_string(), record.upload_time.clone());
        hash.insert(
            fields::STATUS.to_string(),
            VideoStatus::Pending.as_str().to_string(),
        );
        records.insert(record.id, hash);
        Ok(())
    }

    async fn update_fields(
        &self,
        id: Uuid,
        updates: &[(&'static str, String)],
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        let hash = records.get_mut(&id).ok_or(StoreError::NotFound)?;
        for (field, value) in updates {
            hash.insert(field.to_string(), value.clone());
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<VideoRecord, StoreError> {
        let records = self.records.lock().unwrap();
        records
            .get(&id)
            .cloned()
            .map(VideoRecord::from_hash)
            .ok_or(StoreError::NotFound)
    }
}

/// Captures published jobs instead of touching a broker. When watching a
/// store, it also notes whether the job's record was already readable at
/// publish time.
#[derive(Default)]
pub struct RecordingPublisher {
    watched: Option<std::sync::Arc<MemoryJobStore>>,
    pub jobs: Mutex<Vec<ProcessVideoJob>>,
    pub record_existed_at_publish: AtomicBool,
}

impl RecordingPublisher {
    pub fn watching(store: std::sync::Arc<MemoryJobStore>) -> Self {
        Self {
            watched: Some(store),
            ..Self::default()
        }
    }
}

#[async_trait]
impl JobPublisher for RecordingPublisher {
    async fn publish_job(&self, job: &ProcessVideoJob) -> anyhow::Result<()> {
        if let Some(store) = &self.watched
            && store.get(job.video_id).await.is_ok()
        {
            self.record_existed_at_publish.store(true, Ordering::SeqCst);
        }
        self.jobs.lock().unwrap().push(job.clone());
        Ok(())
    }
}
