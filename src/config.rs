use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, VosubError};

const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub media: MediaConfig,
    pub transcriber: TranscriberConfig,
    pub model: ModelConfig,
    pub setup: SetupConfig,
    pub artifacts: ArtifactConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    pub ffprobe_path: String,
    /// Sample rate of the extracted PCM audio
    pub sample_rate: u32,
    /// Channel count of the extracted PCM audio
    pub channels: u32,
    /// Codec used for the attached subtitle stream
    pub subtitle_codec: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Path to the vosk-transcriber binary
    pub binary_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Archive URL of the speech recognition model
    pub url: String,
    /// Directory the archive is extracted into
    pub root_dir: PathBuf,
    /// Name of the model directory inside the archive
    pub name: String,
    /// Path to unzip binary
    pub unzip_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Path to pip binary
    pub pip_path: String,
    /// Packages installed on first use
    pub packages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory holding the intermediate artifacts
    pub work_dir: PathBuf,
    pub audio_file: String,
    pub transcript_file: String,
    pub subtitle_file: String,
    pub output_file: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            sample_rate: 44100,
            channels: 2,
            subtitle_codec: "mov_text".to_string(),
        }
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            binary_path: "vosk-transcriber".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            url: "https://alphacephei.com/vosk/models/vosk-model-fr-0.22.zip".to_string(),
            root_dir: PathBuf::from("vosk_model"),
            name: "vosk-model-fr-0.22".to_string(),
            unzip_path: "unzip".to_string(),
        }
    }
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            pip_path: "pip3".to_string(),
            packages: vec!["vosk".to_string()],
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            audio_file: "output_audio.wav".to_string(),
            transcript_file: "transcribed_text.txt".to_string(),
            subtitle_file: "subtitles.srt".to_string(),
            output_file: "video_with_subtitles.mp4".to_string(),
        }
    }
}

impl ModelConfig {
    /// Directory handed to the transcriber
    pub fn model_path(&self) -> PathBuf {
        self.root_dir.join(&self.name)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VosubError::Config(format!("Failed to read config file: {}", e)))?;

        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VosubError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VosubError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Load the given file, or `config.toml` from the current directory, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                if Path::new(DEFAULT_CONFIG_FILE).exists() {
                    info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                    Self::from_file(DEFAULT_CONFIG_FILE)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
