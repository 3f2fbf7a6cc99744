use clap::Parser;
use std::path::PathBuf;

use crate::workflow::RunOptions;

/// Automatically generate subtitles for videos using Vosk
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input video file
    pub video_input: PathBuf,

    /// Download and extract the Vosk model before running
    #[arg(long)]
    pub dl_vosk_model: bool,

    /// Download and extract the Vosk model, and remove the model directory after the run
    #[arg(long)]
    pub dl_vosk_model_clear: bool,

    /// Install dependencies (vosk, checks ffmpeg) for the first use
    #[arg(long)]
    pub first_use: bool,

    /// Output video file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Suffix intermediate file names with a run id
    #[arg(long)]
    pub unique_artifacts: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            first_use: self.first_use,
            download_model: self.dl_vosk_model,
            clear_model: self.dl_vosk_model_clear,
        }
    }
}
