use futures_util::StreamExt;
use lapin::options::BasicAckOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::infrastructure::media::ffmpeg::{FfmpegThumbnailer, FfprobeInspector};
use crate::infrastructure::queue::rabbitmq::VIDEO_PROCESSING_QUEUE;
use crate::modules::video::events::ProcessVideoJob;
use crate::modules::video::pipeline::{PipelineError, VideoPipeline};
use crate::state::AppState;

pub async fn start_processing_worker(state: AppState) {
    info!("🎥 Starting video processing worker...");

    let mut consumer = state
        .queue
        .consumer(VIDEO_PROCESSING_QUEUE, "video_worker")
        .await
        .expect("Failed to create queue consumer");

    let pipeline = VideoPipeline::new(
        Arc::new(state.videos.clone()),
        Arc::new(FfprobeInspector),
        Arc::new(FfmpegThumbnailer),
        Arc::new(state.storage.clone()),
        PathBuf::from(&state.config.thumbnail_dir),
    );

    info!(
        "🎥 Video processing worker listening on '{}'",
        VIDEO_PROCESSING_QUEUE
    );

    // Jobs run one at a time on this worker; the stages of a single job
    // are blocking by nature (ffmpeg, uploads). Scale by running more
    // worker instances, not by parallelizing a job.
    while let Some(delivery) = consumer.next().await {
        let Ok(delivery) = delivery else {
            continue;
        };

        match serde_json::from_slice::<ProcessVideoJob>(&delivery.data) {
            Ok(job) => {
                info!("📦 Received processing job for video {}", job.video_id);
                match pipeline.run(&job).await {
                    Ok(()) => info!("✅ Video {} processed", job.video_id),
                    Err(PipelineError::Stage(e)) => {
                        // Already recorded in the store; the job is
                        // terminally failed.
                        error!("❌ Video {} failed: {}", job.video_id, e);
                    }
                    Err(PipelineError::Store(e)) => {
                        // Completed stage work (e.g. a finished upload) is
                        // not rolled back; the record may lag what
                        // actually happened.
                        error!("❌ Store write failed for video {}: {}", job.video_id, e);
                    }
                }
            }
            Err(e) => {
                error!("❌ Failed to parse job payload: {}", e);
            }
        }

        if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
            error!("Failed to ack message: {}", e);
        }
    }
}
