use thiserror::Error;

use crate::workflow::Step;

#[derive(Error, Debug)]
pub enum VosubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transcript contains no non-blank lines")]
    EmptyTranscript,

    #[error("Invalid video duration: {0}")]
    InvalidDuration(String),

    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: Step,
        #[source]
        source: Box<VosubError>,
    },

    #[error("Subtitle error: {0}")]
    Subtitle(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl VosubError {
    pub fn external<T: Into<String>, M: Into<String>>(tool: T, message: M) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Step the error was raised in, if it came out of the pipeline
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::StepFailed { step, .. } => Some(*step),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VosubError>;
