//! The processing pipeline: probe → thumbnail → archive video → archive
//! thumbnail → finalize.
//!
//! Each stage is gated on the previous one. The first failing stage writes
//! `status=failed` plus a stage-tagged error to the store and the run ends
//! there; nothing is retried. Collaborators sit behind traits so tests can
//! run the whole pipeline against fakes.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::events::ProcessVideoJob;
use super::keys;
use super::model::{VideoStatus, fields};
use super::repository::{JobStore, StoreError};

/// Duration extraction. Production: ffprobe.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    async fn probe_duration(&self, path: &Path) -> anyhow::Result<f64>;
}

/// Single still-frame extraction at a timestamp offset. Production: ffmpeg.
#[async_trait]
pub trait ThumbnailExtractor: Send + Sync {
    async fn extract_frame(&self, src: &Path, offset_secs: f64, dest: &Path) -> anyhow::Result<()>;
}

/// Durable remote asset storage returning a public URL. Production:
/// Cloudinary.
#[async_trait]
pub trait RemoteArchiver: Send + Sync {
    async fn archive_video(&self, path: &Path, public_id: &str) -> anyhow::Result<String>;
    async fn archive_image(&self, path: &Path, public_id: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Probe,
    Thumbnail,
    VideoArchive,
    ThumbnailArchive,
}

impl Stage {
    /// Prefix of the client-visible error string. Clients only ever see
    /// this plus the collaborator's detail text, never a raw error type.
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            Stage::Probe => "FFmpeg probe failed:",
            Stage::Thumbnail => "Thumbnail generation failed:",
            Stage::VideoArchive => "Cloudinary video upload failed:",
            Stage::ThumbnailArchive => "Cloudinary thumbnail upload failed:",
        }
    }
}

#[derive(Debug, Error)]
#[error("{} {detail}", .stage.failure_prefix())]
pub struct StageError {
    pub stage: Stage,
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Formats a duration in seconds as `MM:SS` with integer division. Minutes
/// are deliberately not capped at 59: there is no hour component, so
/// 3661 s renders as "61:01".
pub fn format_duration(seconds: f64) -> String {
    let total = seconds as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

pub struct VideoPipeline {
    store: Arc<dyn JobStore>,
    inspector: Arc<dyn MediaInspector>,
    thumbnailer: Arc<dyn ThumbnailExtractor>,
    archiver: Arc<dyn RemoteArchiver>,
    thumbnail_dir: PathBuf,
}

impl VideoPipeline {
    pub fn new(
        store: Arc<dyn JobStore>,
        inspector: Arc<dyn MediaInspector>,
        thumbnailer: Arc<dyn ThumbnailExtractor>,
        archiver: Arc<dyn RemoteArchiver>,
        thumbnail_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            inspector,
            thumbnailer,
            archiver,
            thumbnail_dir,
        }
    }

    /// Runs all stages for one job. Stage failures are recorded in the
    /// store and returned; store failures propagate directly. The local
    /// upload and thumbnail files are left on disk either way, so a failed
    /// job can be inspected afterwards.
    pub async fn run(&self, job: &ProcessVideoJob) -> Result<(), PipelineError> {
        let id = job.video_id;
        info!("Processing video {} ({})", id, job.filename);

        // Stage 1: probe.
        let duration = match self.inspector.probe_duration(&job.file_path).await {
            Ok(d) => d,
            Err(e) => return Err(self.fail(id, Stage::Probe, e).await?),
        };
        let duration_str = format_duration(duration);

        // Stage 2: thumbnail at 10% of the runtime.
        let offset = duration * 0.1;
        let thumb_path = keys::thumbnail_path(&self.thumbnail_dir, id);
        if let Err(e) = self
            .thumbnailer
            .extract_frame(&job.file_path, offset, &thumb_path)
            .await
        {
            return Err(self.fail(id, Stage::Thumbnail, e).await?);
        }

        // Stage 3: archive the original video.
        let cloud_url = match self
            .archiver
            .archive_video(&job.file_path, &keys::remote_video_key(id))
            .await
        {
            Ok(url) => url,
            Err(e) => return Err(self.fail(id, Stage::VideoArchive, e).await?),
        };

        // Stage 4: archive the thumbnail.
        let thumbnail_url = match self
            .archiver
            .archive_image(&thumb_path, &keys::remote_thumbnail_key(id))
            .await
        {
            Ok(url) => url,
            Err(e) => return Err(self.fail(id, Stage::ThumbnailArchive, e).await?),
        };

        // Stage 5: finalize. One update so readers never observe a partial
        // success.
        self.store
            .update_fields(
                id,
                &[
                    (fields::DURATION, duration_str),
                    (fields::THUMBNAIL_URL, thumbnail_url),
                    (fields::CLOUD_URL, cloud_url),
                    (fields::STATUS, VideoStatus::Done.as_str().to_string()),
                ],
            )
            .await?;

        info!("Video {} processed successfully", id);
        Ok(())
    }

    /// Writes the one-and-only failure record for this run and hands back
    /// the stage error for the caller to surface.
    async fn fail(
        &self,
        id: Uuid,
        stage: Stage,
        source: anyhow::Error,
    ) -> Result<PipelineError, PipelineError> {
        let err = StageError {
            stage,
            detail: format!("{source:#}"),
        };

        self.store
            .update_fields(
                id,
                &[
                    (fields::STATUS, VideoStatus::Failed.as_str().to_string()),
                    (fields::ERROR, err.to_string()),
                ],
            )
            .await?;

        Ok(PipelineError::Stage(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::video::model::NewVideoRecord;
    use crate::modules::video::testing::MemoryJobStore;
    use anyhow::anyhow;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeInspector {
        result: Result<f64, String>,
        calls: AtomicUsize,
    }

    impl FakeInspector {
        fn ok(duration: f64) -> Self {
            Self {
                result: Ok(duration),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(detail: &str) -> Self {
            Self {
                result: Err(detail.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MediaInspector for FakeInspector {
        async fn probe_duration(&self, _path: &Path) -> anyhow::Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map_err(|e| anyhow!(e))
        }
    }

    #[derive(Default)]
    struct FakeThumbnailer {
        fail: bool,
        calls: AtomicUsize,
        last_offset: Mutex<Option<f64>>,
        last_dest: Mutex<Option<PathBuf>>,
    }

    #[async_trait]
    impl ThumbnailExtractor for FakeThumbnailer {
        async fn extract_frame(
            &self,
            _src: &Path,
            offset_secs: f64,
            dest: &Path,
        ) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_offset.lock().unwrap() = Some(offset_secs);
            *self.last_dest.lock().unwrap() = Some(dest.to_path_buf());
            if self.fail {
                return Err(anyhow!("no such frame"));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeArchiver {
        fail_video: bool,
        fail_image: bool,
        video_calls: AtomicUsize,
        image_calls: AtomicUsize,
        last_video_key: Mutex<Option<String>>,
        last_image_key: Mutex<Option<String>>,
    }

    #[async_trait]
    impl RemoteArchiver for FakeArchiver {
        async fn archive_video(&self, _path: &Path, public_id: &str) -> anyhow::Result<String> {
            self.video_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_video_key.lock().unwrap() = Some(public_id.to_string());
            if self.fail_video {
                return Err(anyhow!("connection reset"));
            }
            Ok(format!("https://res.example.com/{public_id}.mp4"))
        }

        async fn archive_image(&self, _path: &Path, public_id: &str) -> anyhow::Result<String> {
            self.image_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_image_key.lock().unwrap() = Some(public_id.to_string());
            if self.fail_image {
                return Err(anyhow!("connection reset"));
            }
            Ok(format!("https://res.example.com/{public_id}.jpg"))
        }
    }

    struct Harness {
        store: Arc<MemoryJobStore>,
        inspector: Arc<FakeInspector>,
        thumbnailer: Arc<FakeThumbnailer>,
        archiver: Arc<FakeArchiver>,
        pipeline: VideoPipeline,
        job: ProcessVideoJob,
    }

    async fn harness(
        inspector: FakeInspector,
        thumbnailer: FakeThumbnailer,
        archiver: FakeArchiver,
    ) -> Harness {
        let store = Arc::new(MemoryJobStore::default());
        let inspector = Arc::new(inspector);
        let thumbnailer = Arc::new(thumbnailer);
        let archiver = Arc::new(archiver);

        let pipeline = VideoPipeline::new(
            store.clone(),
            inspector.clone(),
            thumbnailer.clone(),
            archiver.clone(),
            PathBuf::from("thumbnails"),
        );

        let id = Uuid::new_v4();
        store
            .create(&NewVideoRecord {
                id,
                filename: "clip.mp4".to_string(),
                upload_time: "2026-01-01T00:00:00Z".to_string(),
            })
            .await
            .unwrap();

        let job = ProcessVideoJob {
            video_id: id,
            file_path: PathBuf::from(format!("uploads/{id}_clip.mp4")),
            filename: "clip.mp4".to_string(),
        };

        Harness {
            store,
            inspector,
            thumbnailer,
            archiver,
            pipeline,
            job,
        }
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(125.4), "02:05");
        assert_eq!(format_duration(59.9), "00:59");
        // Minutes roll past 59 instead of carrying into an hour field.
        assert_eq!(format_duration(3661.0), "61:01");
        assert_eq!(format_duration(0.0), "00:00");
        assert_eq!(format_duration(96.0), "01:36");
    }

    #[tokio::test]
    async fn freshly_created_record_is_bare_pending() {
        let h = harness(
            FakeInspector::ok(96.0),
            FakeThumbnailer::default(),
            FakeArchiver::default(),
        )
        .await;

        // Before the pipeline runs, a poller sees a bare pending record.
        let record = h.store.record(h.job.video_id);
        assert_eq!(record.status, VideoStatus::Pending);
        assert!(record.error.is_none());
        assert!(record.duration.is_none());
        assert!(record.thumbnail_url.is_none());
        assert!(record.cloud_url.is_none());
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let h = harness(
            FakeInspector::ok(96.0),
            FakeThumbnailer::default(),
            FakeArchiver::default(),
        )
        .await;

        let again = h
            .store
            .create(&NewVideoRecord {
                id: h.job.video_id,
                filename: "clip.mp4".to_string(),
                upload_time: "2026-01-01T00:00:01Z".to_string(),
            })
            .await;
        assert!(matches!(again, Err(StoreError::DuplicateKey)));
    }

    #[tokio::test]
    async fn happy_path_finalizes_record() {
        let h = harness(
            FakeInspector::ok(96.0),
            FakeThumbnailer::default(),
            FakeArchiver::default(),
        )
        .await;

        h.pipeline.run(&h.job).await.unwrap();

        assert_eq!(h.inspector.calls.load(Ordering::SeqCst), 1);

        let record = h.store.record(h.job.video_id);
        assert_eq!(record.status, VideoStatus::Done);
        assert_eq!(record.duration.as_deref(), Some("01:36"));
        assert!(record.cloud_url.as_deref().unwrap().starts_with("https://"));
        assert!(
            record
                .thumbnail_url
                .as_deref()
                .unwrap()
                .starts_with("https://")
        );
        assert!(record.error.is_none());

        // Thumbnail was taken at 10% of the 96s runtime.
        let offset = h.thumbnailer.last_offset.lock().unwrap().unwrap();
        assert!((offset - 9.6).abs() < 1e-9, "offset was {offset}");
        assert_eq!(
            *h.thumbnailer.last_dest.lock().unwrap(),
            Some(keys::thumbnail_path(Path::new("thumbnails"), h.job.video_id))
        );
        assert_eq!(
            h.archiver.last_video_key.lock().unwrap().as_deref(),
            Some(keys::remote_video_key(h.job.video_id).as_str())
        );
        assert_eq!(
            h.archiver.last_image_key.lock().unwrap().as_deref(),
            Some(keys::remote_thumbnail_key(h.job.video_id).as_str())
        );
    }

    #[tokio::test]
    async fn probe_failure_halts_before_thumbnail_and_uploads() {
        let h = harness(
            FakeInspector::failing("moov atom not found"),
            FakeThumbnailer::default(),
            FakeArchiver::default(),
        )
        .await;

        let err = h.pipeline.run(&h.job).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Stage(StageError {
                stage: Stage::Probe,
                ..
            })
        ));

        let record = h.store.record(h.job.video_id);
        assert_eq!(record.status, VideoStatus::Failed);
        let error = record.error.unwrap();
        assert!(error.starts_with("FFmpeg probe failed:"), "{error}");
        assert!(error.contains("moov atom not found"));

        assert_eq!(h.thumbnailer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.archiver.video_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.archiver.image_calls.load(Ordering::SeqCst), 0);
        assert!(record.duration.is_none());
    }

    #[tokio::test]
    async fn thumbnail_failure_halts_before_uploads() {
        let h = harness(
            FakeInspector::ok(96.0),
            FakeThumbnailer {
                fail: true,
                ..FakeThumbnailer::default()
            },
            FakeArchiver::default(),
        )
        .await;

        h.pipeline.run(&h.job).await.unwrap_err();

        let record = h.store.record(h.job.video_id);
        assert_eq!(record.status, VideoStatus::Failed);
        assert!(
            record
                .error
                .unwrap()
                .starts_with("Thumbnail generation failed:")
        );
        assert_eq!(h.archiver.video_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.archiver.image_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn video_archive_failure_skips_thumbnail_archive() {
        let h = harness(
            FakeInspector::ok(96.0),
            FakeThumbnailer::default(),
            FakeArchiver {
                fail_video: true,
                ..FakeArchiver::default()
            },
        )
        .await;

        h.pipeline.run(&h.job).await.unwrap_err();

        let record = h.store.record(h.job.video_id);
        assert_eq!(record.status, VideoStatus::Failed);
        assert!(
            record
                .error
                .unwrap()
                .starts_with("Cloudinary video upload failed:")
        );
        assert_eq!(h.archiver.image_calls.load(Ordering::SeqCst), 0);
        assert!(record.cloud_url.is_none());
        assert!(record.thumbnail_url.is_none());
    }

    #[tokio::test]
    async fn thumbnail_archive_failure_is_stage_tagged() {
        let h = harness(
            FakeInspector::ok(96.0),
            FakeThumbnailer::default(),
            FakeArchiver {
                fail_image: true,
                ..FakeArchiver::default()
            },
        )
        .await;

        h.pipeline.run(&h.job).await.unwrap_err();

        let record = h.store.record(h.job.video_id);
        assert_eq!(record.status, VideoStatus::Failed);
        assert!(
            record
                .error
                .unwrap()
                .starts_with("Cloudinary thumbnail upload failed:")
        );
        assert_eq!(h.archiver.video_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn replaying_a_terminal_write_is_idempotent() {
        let h = harness(
            FakeInspector::ok(96.0),
            FakeThumbnailer::default(),
            FakeArchiver::default(),
        )
        .await;

        h.pipeline.run(&h.job).await.unwrap();
        let first = h.store.record(h.job.video_id);

        // A second identical run replays the same finalize write.
        h.pipeline.run(&h.job).await.unwrap();
        let second = h.store.record(h.job.video_id);

        assert_eq!(second.status, VideoStatus::Done);
        assert_eq!(first.duration, second.duration);
        assert_eq!(first.cloud_url, second.cloud_url);
        assert_eq!(first.thumbnail_url, second.thumbnail_url);
    }

    #[tokio::test]
    async fn store_failure_during_fail_write_propagates() {
        let store = Arc::new(MemoryJobStore::default());
        let pipeline = VideoPipeline::new(
            store,
            Arc::new(FakeInspector::failing("boom")),
            Arc::new(FakeThumbnailer::default()),
            Arc::new(FakeArchiver::default()),
            PathBuf::from("thumbnails"),
        );

        // No record was ever created for this id.
        let job = ProcessVideoJob {
            video_id: Uuid::new_v4(),
            file_path: PathBuf::from("uploads/missing.mp4"),
            filename: "missing.mp4".to_string(),
        };

        let err = pipeline.run(&job).await.unwrap_err();
        assert!(matches!(err, PipelineError::Store(StoreError::NotFound)));
    }
}
