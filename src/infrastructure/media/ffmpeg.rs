//! FFmpeg-backed collaborators: duration probing and still-frame extraction.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::modules::video::pipeline::{MediaInspector, ThumbnailExtractor};

/// FFprobe JSON output, reduced to the container-level fields we read.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Clone, Default)]
pub struct FfprobeInspector;

#[async_trait]
impl MediaInspector for FfprobeInspector {
    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let output = Command::new("ffprobe")
            .args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| anyhow!("failed to spawn ffprobe: {}", e))?;

        if !output.status.success() {
            return Err(anyhow!(
                "{}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| anyhow!("unparseable ffprobe output: {}", e))?;

        probe
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .ok_or_else(|| anyhow!("no duration in container format"))
    }
}

#[derive(Clone, Default)]
pub struct FfmpegThumbnailer;

#[async_trait]
impl ThumbnailExtractor for FfmpegThumbnailer {
    async fn extract_frame(&self, src: &Path, offset_secs: f64, dest: &Path) -> Result<()> {
        // Seek before the input for a fast keyframe-based seek; one mjpeg
        // frame written as a plain image file.
        let output = Command::new("ffmpeg")
            .arg("-ss")
            .arg(format!("{offset_secs}"))
            .arg("-i")
            .arg(src)
            .args(["-frames:v", "1", "-f", "image2", "-c:v", "mjpeg", "-y"])
            .arg(dest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| anyhow!("failed to spawn ffmpeg: {}", e))?;

        if !output.status.success() {
            return Err(anyhow!(
                "{}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(())
    }
}
