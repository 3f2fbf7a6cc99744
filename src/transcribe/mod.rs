// Speech-to-text collaborators
//
// The pipeline only needs plain text with one utterance per line, so the
// trait is deliberately narrow. VoskTranscriber drives the vosk-transcriber
// command line tool.

pub mod vosk;

use async_trait::async_trait;
use std::path::Path;

pub use vosk::VoskTranscriber;

use crate::error::Result;

/// Turns an audio file into a plain-text transcript
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio_path` with the model in `model_dir`, writing the text to `output_path`
    async fn transcribe(
        &self,
        audio_path: &Path,
        model_dir: &Path,
        output_path: &Path,
    ) -> Result<()>;
}
