//! Transcoding engine backed by ffmpeg/ffprobe.
//!
//! The engine is an explicitly managed resource: `acquire()` verifies
//! tool availability and creates a per-invocation scratch directory,
//! `shutdown()` tears the scratch directory down. The orchestrator
//! acquires one engine per submission and shuts it down on every exit
//! path; engines are never shared across invocations.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Bitrate of the full-quality MP3 rendition.
pub const FULL_MP3_BITRATE_KBPS: u32 = 320;
/// Bitrate of the preview clip.
pub const PREVIEW_BITRATE_KBPS: u32 = 192;
/// Sample rate of every derived rendition.
pub const OUTPUT_SAMPLE_RATE_HZ: u32 = 44_100;

const PREVIEW_MAX_SECS: f64 = 60.0;
const PREVIEW_SKIP_INTRO_SECS: f64 = 30.0;
const PREVIEW_FADE_SECS: f64 = 5.0;

/// Errors that can occur during probing and transcoding.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Transcoding engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("ffprobe failed: {0}")]
    ProbeFailed(String),

    #[error("ffmpeg failed: {0}")]
    TranscodeFailed(String),

    #[error("Invalid probe output: {0}")]
    InvalidOutput(String),

    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio metadata extracted from ffprobe.
#[derive(Debug, Clone)]
pub struct AudioProbe {
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio codec name.
    pub codec: String,
    /// Sample rate in Hz.
    pub sample_rate: Option<u32>,
    /// Number of channels.
    pub channels: Option<u32>,
    /// Container format name (e.g. "wav", "flac").
    pub format: String,
}

/// Cut points for a preview clip, derived from the source duration.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSpec {
    /// Offset into the source where the clip starts.
    pub start_secs: f64,
    /// Clip length.
    pub duration_secs: f64,
    /// Offset within the clip where the linear fade-out begins.
    pub fade_start_secs: f64,
}

/// Compute the preview cut points. Clips start at the 30-second mark to
/// skip typical intros; sources shorter than 90 seconds start at 0 so
/// the clip still has material. A 5-second fade-out ends the clip.
pub fn preview_spec(source_duration_secs: f64) -> PreviewSpec {
    let start_secs = if source_duration_secs >= PREVIEW_SKIP_INTRO_SECS + PREVIEW_MAX_SECS {
        PREVIEW_SKIP_INTRO_SECS
    } else {
        0.0
    };
    let duration_secs = PREVIEW_MAX_SECS.min((source_duration_secs - start_secs).max(0.0));
    let fade_start_secs = (duration_secs - PREVIEW_FADE_SECS).max(0.0);

    PreviewSpec {
        start_secs,
        duration_secs,
        fade_start_secs,
    }
}

/// One acquired transcoding engine. All operations are file-to-file
/// within the invocation's scratch directory.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Probe an audio file for duration and stream metadata.
    async fn probe(&self, input: &Path) -> Result<AudioProbe, TranscodeError>;

    /// Derive a constant-bitrate MP3 at the output sample rate.
    async fn transcode_to_mp3(
        &self,
        input: &Path,
        output: &Path,
        bitrate_kbps: u32,
    ) -> Result<(), TranscodeError>;

    /// Derive a PCM 16-bit WAV at the output sample rate.
    async fn transcode_to_wav(&self, input: &Path, output: &Path) -> Result<(), TranscodeError>;

    /// Cut a preview clip from an MP3 rendition.
    async fn extract_preview(
        &self,
        input: &Path,
        output: &Path,
        spec: &PreviewSpec,
    ) -> Result<(), TranscodeError>;

    /// Scratch directory owned by this engine, removed at shutdown.
    fn scratch_dir(&self) -> &Path;

    /// Tear the engine down. Must be called exactly once per
    /// invocation; the scratch directory is gone afterwards.
    async fn shutdown(&self) -> Result<(), TranscodeError>;
}

/// Hands out engines, one per pipeline invocation.
#[async_trait]
pub trait TranscodeEngineFactory: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn TranscodeEngine>, TranscodeError>;
}

// =============================================================================
// ffmpeg implementation
// =============================================================================

/// Factory for ffmpeg-backed engines.
pub struct FfmpegEngineFactory;

#[async_trait]
impl TranscodeEngineFactory for FfmpegEngineFactory {
    async fn acquire(&self) -> Result<Box<dyn TranscodeEngine>, TranscodeError> {
        if !cfg!(feature = "no_ffmpeg_check") {
            check_tool("ffprobe").await?;
            check_tool("ffmpeg").await?;
        }

        let id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        let scratch = std::env::temp_dir().join(format!("pressroom-engine-{}", id));
        tokio::fs::create_dir_all(&scratch).await?;

        info!("Acquired transcoding engine {} ({:?})", id, scratch);

        Ok(Box::new(FfmpegEngine { id, scratch }))
    }
}

/// ffmpeg/ffprobe driven through subprocesses.
pub struct FfmpegEngine {
    id: String,
    scratch: PathBuf,
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    async fn probe(&self, input: &Path) -> Result<AudioProbe, TranscodeError> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(input)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscodeError::ProbeFailed(stderr.to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let probe: FfprobeOutput = serde_json::from_str(&stdout)
            .map_err(|e| TranscodeError::InvalidOutput(format!("JSON parse error: {}", e)))?;

        let audio_stream = probe
            .streams
            .iter()
            .find(|s| s.codec_type == "audio")
            .ok_or_else(|| TranscodeError::InvalidOutput("No audio stream found".to_string()))?;

        let duration_secs: f64 = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse().ok())
            .unwrap_or(0.0);

        Ok(AudioProbe {
            duration_secs,
            codec: audio_stream
                .codec_name
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            sample_rate: audio_stream
                .sample_rate
                .as_ref()
                .and_then(|sr| sr.parse().ok()),
            channels: audio_stream.channels,
            format: probe.format.format_name,
        })
    }

    async fn transcode_to_mp3(
        &self,
        input: &Path,
        output: &Path,
        bitrate_kbps: u32,
    ) -> Result<(), TranscodeError> {
        let bitrate = format!("{}k", bitrate_kbps);
        let sample_rate = OUTPUT_SAMPLE_RATE_HZ.to_string();
        let args: Vec<&str> = vec![
            "-c:a",
            "libmp3lame",
            "-b:a",
            &bitrate,
            "-ar",
            &sample_rate,
        ];
        run_ffmpeg(input, output, &args).await
    }

    async fn transcode_to_wav(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        let sample_rate = OUTPUT_SAMPLE_RATE_HZ.to_string();
        let args: Vec<&str> = vec!["-c:a", "pcm_s16le", "-ar", &sample_rate];
        run_ffmpeg(input, output, &args).await
    }

    async fn extract_preview(
        &self,
        input: &Path,
        output: &Path,
        spec: &PreviewSpec,
    ) -> Result<(), TranscodeError> {
        let bitrate = format!("{}k", PREVIEW_BITRATE_KBPS);
        let fade = format!(
            "afade=t=out:st={:.3}:d={:.3}",
            spec.fade_start_secs, PREVIEW_FADE_SECS
        );

        // -ss before -i seeks the input, so filter timestamps are
        // relative to the clip start.
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let result = Command::new("ffmpeg")
            .args(["-ss", &format!("{:.3}", spec.start_secs)])
            .args(["-t", &format!("{:.3}", spec.duration_secs)])
            .arg("-i")
            .arg(input)
            .args(["-af", &fade])
            .args(["-c:a", "libmp3lame", "-b:a", &bitrate])
            .args(["-vn", "-y"])
            .arg(output)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(TranscodeError::TranscodeFailed(stderr.to_string()));
        }

        Ok(())
    }

    fn scratch_dir(&self) -> &Path {
        &self.scratch
    }

    async fn shutdown(&self) -> Result<(), TranscodeError> {
        if self.scratch.exists() {
            tokio::fs::remove_dir_all(&self.scratch).await?;
        }
        debug!("Transcoding engine {} shut down", self.id);
        Ok(())
    }
}

async fn run_ffmpeg(input: &Path, output: &Path, codec_args: &[&str]) -> Result<(), TranscodeError> {
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let result = Command::new("ffmpeg")
        .arg("-i")
        .arg(input)
        .args(codec_args)
        .args(["-vn", "-y"])
        .arg(output)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(TranscodeError::TranscodeFailed(stderr.to_string()));
    }

    Ok(())
}

async fn check_tool(name: &str) -> Result<(), TranscodeError> {
    let status = Command::new(name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(s) if s.success() => Ok(()),
        _ => Err(TranscodeError::EngineUnavailable(format!(
            "{} not found or not working",
            name
        ))),
    }
}

/// ffprobe JSON output structure.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: String,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_spec_long_source() {
        let spec = preview_spec(240.0);
        assert_eq!(spec.start_secs, 30.0);
        assert_eq!(spec.duration_secs, 60.0);
        assert_eq!(spec.fade_start_secs, 55.0);
    }

    #[test]
    fn test_preview_spec_exactly_ninety_seconds() {
        let spec = preview_spec(90.0);
        assert_eq!(spec.start_secs, 30.0);
        assert_eq!(spec.duration_secs, 60.0);
    }

    #[test]
    fn test_preview_spec_short_source_starts_at_zero() {
        let spec = preview_spec(45.0);
        assert_eq!(spec.start_secs, 0.0);
        assert_eq!(spec.duration_secs, 45.0);
        assert_eq!(spec.fade_start_secs, 40.0);
    }

    #[test]
    fn test_preview_spec_very_short_source() {
        let spec = preview_spec(3.0);
        assert_eq!(spec.start_secs, 0.0);
        assert_eq!(spec.duration_secs, 3.0);
        // Fade covers the whole clip rather than going negative
        assert_eq!(spec.fade_start_secs, 0.0);
    }

    #[test]
    fn test_preview_never_exceeds_sixty_seconds() {
        for dur in [10.0, 59.0, 90.0, 91.0, 600.0, 3600.0] {
            assert!(preview_spec(dur).duration_secs <= 60.0);
        }
    }

    #[test]
    fn test_ffprobe_output_parses() {
        let json = r#"{
            "format": {"format_name": "wav", "duration": "182.5"},
            "streams": [
                {"codec_type": "audio", "codec_name": "pcm_s16le", "sample_rate": "44100", "channels": 2}
            ]
        }"#;

        let probe: FfprobeOutput = serde_json::from_str(json).unwrap();
        assert_eq!(probe.format.format_name, "wav");
        assert_eq!(probe.streams[0].codec_name.as_deref(), Some("pcm_s16le"));
    }
}
