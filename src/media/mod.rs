// Media collaborators
//
// Each external media operation sits behind its own narrow trait so the
// workflow can be driven by test doubles:
// - DurationProbe: total duration of a video
// - AudioExtractor: PCM audio track of a video
// - Muxer: video with an attached subtitle stream
//
// FfmpegProcessor implements all three on top of ffprobe/ffmpeg.

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::error::Result;

/// Reports the duration of a video in seconds
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn probe_duration(&self, video_path: &Path) -> Result<f64>;
}

/// Writes the audio track of a video as PCM
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()>;
}

/// Attaches a subtitle file to a video without re-encoding
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Muxer: Send + Sync {
    async fn embed_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()>;
}
