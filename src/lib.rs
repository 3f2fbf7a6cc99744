//! Vosub - Automated Subtitle Generation
//!
//! Extracts the audio of a video, transcribes it with Vosk, spreads the
//! transcript uniformly over the video duration as SubRip cues and muxes
//! the subtitle track back into the container with ffmpeg.

pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod media;
pub mod setup;
pub mod subtitle;
pub mod transcribe;
pub mod workflow;
