//! Vosub - Automated Subtitle Generation
//!
//! Entry point: parses the command line, sets up logging, loads the
//! configuration and runs the subtitle workflow for one video.

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vosub::cli::Args;
use vosub::config::Config;
use vosub::workflow::{new_run_id, ArtifactPaths, Collaborators, Workflow};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = setup_logging(args.verbose)?;

    info!("Starting Vosub - Automated Subtitle Generation");

    let config = Config::load(args.config.as_deref())?;

    let run_id = args.unique_artifacts.then(new_run_id);
    let artifacts = ArtifactPaths::from_config(&config, args.output.as_deref(), run_id.as_deref());
    let workflow = Workflow::new(artifacts, Collaborators::from_config(&config)?);
    debug!("Artifact paths: {:?}", workflow.artifacts());

    match workflow.run(&args.video_input, &args.run_options()).await {
        Ok(report) => {
            info!(
                "Subtitles added to {} ({} cues over {:.3}s)",
                report.output.display(),
                report.cue_count,
                report.duration
            );
            Ok(())
        }
        Err(e) => {
            if let Some(step) = e.step() {
                error!("Aborted at step '{}'", step);
            }
            Err(e.into())
        }
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".vosub").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation
    let file_appender = rolling::daily(&log_dir, "vosub.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("vosub.log").display()
    );

    Ok(guard)
}
