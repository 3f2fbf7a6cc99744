use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use super::Transcriber;
use crate::command::ToolCommand;
use crate::config::TranscriberConfig;
use crate::error::{Result, VosubError};

/// vosk-transcriber command line implementation
pub struct VoskTranscriber {
    config: TranscriberConfig,
}

impl VoskTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    fn command(&self, audio_path: &Path, model_dir: &Path) -> ToolCommand {
        ToolCommand::new(&self.config.binary_path, "Transcription")
            .arg("-i")
            .path(audio_path)
            .arg("-m")
            .path(model_dir)
    }
}

#[async_trait]
impl Transcriber for VoskTranscriber {
    async fn transcribe(
        &self,
        audio_path: &Path,
        model_dir: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Transcribing {} with model {}",
            audio_path.display(),
            model_dir.display()
        );

        let model_present = fs::metadata(model_dir)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if !model_present {
            return Err(VosubError::external(
                "Transcription",
                format!(
                    "model directory {} does not exist, run with --dl-vosk-model first",
                    model_dir.display()
                ),
            ));
        }

        // stdout carries the recognized text, one utterance per line
        let stdout = self.command(audio_path, model_dir).run().await?;
        debug!("Transcriber produced {} bytes", stdout.len());
        fs::write(output_path, &stdout).await?;

        info!("Transcript written to {}", output_path.display());
        Ok(())
    }
}
