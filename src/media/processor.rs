use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

use super::{AudioExtractor, DurationProbe, MediaCommandBuilder, Muxer};
use crate::config::MediaConfig;
use crate::error::{Result, VosubError};

/// ffmpeg/ffprobe backed media collaborators
pub struct FfmpegProcessor {
    command_builder: MediaCommandBuilder,
}

impl FfmpegProcessor {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            command_builder: MediaCommandBuilder::new(config),
        }
    }
}

/// Parse the seconds value printed by ffprobe
pub fn parse_duration(output: &str) -> Result<f64> {
    let trimmed = output.trim();
    let duration: f64 = trimmed.parse().map_err(|_| {
        VosubError::InvalidDuration(format!("unparsable probe output '{}'", trimmed))
    })?;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(VosubError::InvalidDuration(format!(
            "probe reported {} seconds",
            duration
        )));
    }

    Ok(duration)
}

#[async_trait]
impl DurationProbe for FfmpegProcessor {
    async fn probe_duration(&self, video_path: &Path) -> Result<f64> {
        debug!("Probing duration of {}", video_path.display());

        let stdout = self.command_builder.probe_duration(video_path).run().await?;
        let duration = parse_duration(&String::from_utf8_lossy(&stdout))?;

        info!("Video duration: {:.3}s", duration);
        Ok(duration)
    }
}

#[async_trait]
impl AudioExtractor for FfmpegProcessor {
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        info!(
            "Extracting audio from {} to {}",
            video_path.display(),
            audio_path.display()
        );

        self.command_builder
            .extract_audio(video_path, audio_path)
            .execute()
            .await?;

        info!("Audio extraction completed");
        Ok(())
    }
}

#[async_trait]
impl Muxer for FfmpegProcessor {
    async fn embed_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Embedding subtitles from {} into {} -> {}",
            subtitle_path.display(),
            video_path.display(),
            output_path.display()
        );

        self.command_builder
            .embed_subtitles(video_path, subtitle_path, output_path)
            .execute()
            .await?;

        info!("Subtitle embedding completed successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("12.345000\n").unwrap(), 12.345);
        assert_eq!(parse_duration("  3700 ").unwrap(), 3700.0);
    }

    #[test]
    fn test_parse_duration_rejects_bad_output() {
        for output in ["", "N/A", "0.000000", "-1.5", "inf", "NaN"] {
            assert!(
                matches!(parse_duration(output), Err(VosubError::InvalidDuration(_))),
                "accepted '{}'",
                output
            );
        }
    }

    #[tokio::test]
    async fn test_missing_ffprobe_reports_tool() {
        let processor = FfmpegProcessor::new(MediaConfig {
            ffprobe_path: "/nonexistent/ffprobe".to_string(),
            ..MediaConfig::default()
        });

        let result = processor.probe_duration(Path::new("video.mp4")).await;
        match result {
            Err(VosubError::ExternalTool { tool, .. }) => assert_eq!(tool, "Duration probe"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
