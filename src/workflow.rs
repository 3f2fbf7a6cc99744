use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Result, VosubError};
use crate::media::{AudioExtractor, DurationProbe, FfmpegProcessor, Muxer};
use crate::setup::{Provisioner, SetupManager};
use crate::subtitle::generate_srt;
use crate::transcribe::{Transcriber, VoskTranscriber};

/// Named pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    InstallDependencies,
    FetchModel,
    Probe,
    ExtractAudio,
    Transcribe,
    Synthesize,
    Mux,
    Cleanup,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::InstallDependencies => "install-dependencies",
            Step::FetchModel => "fetch-model",
            Step::Probe => "probe",
            Step::ExtractAudio => "extract-audio",
            Step::Transcribe => "transcribe",
            Step::Synthesize => "synthesize",
            Step::Mux => "mux",
            Step::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every file the pipeline reads or writes
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub audio: PathBuf,
    pub transcript: PathBuf,
    pub subtitles: PathBuf,
    pub output: PathBuf,
    pub model_dir: PathBuf,
}

impl ArtifactPaths {
    /// Resolve paths from configuration.
    ///
    /// With a `run_id`, intermediate file names get it as a suffix so several
    /// runs can share a working directory.
    pub fn from_config(config: &Config, output: Option<&Path>, run_id: Option<&str>) -> Self {
        let artifacts = &config.artifacts;
        let intermediate = |name: &str| {
            let name = match run_id {
                Some(id) => with_run_id(name, id),
                None => name.to_string(),
            };
            artifacts.work_dir.join(name)
        };

        Self {
            audio: intermediate(&artifacts.audio_file),
            transcript: intermediate(&artifacts.transcript_file),
            subtitles: intermediate(&artifacts.subtitle_file),
            output: output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| artifacts.work_dir.join(&artifacts.output_file)),
            model_dir: config.model.model_path(),
        }
    }

    /// Intermediate artifacts removed after a successful run
    pub fn intermediates(&self) -> [&Path; 3] {
        [&self.audio, &self.transcript, &self.subtitles]
    }
}

fn with_run_id(file_name: &str, run_id: &str) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, run_id, ext.to_string_lossy()),
        None => format!("{}-{}", stem, run_id),
    }
}

/// Generate an identifier for `ArtifactPaths::from_config`
pub fn new_run_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Optional toggles evaluated around the pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Install external packages first
    pub first_use: bool,
    /// Fetch the speech model first
    pub download_model: bool,
    /// Fetch the model first and delete the model directory afterwards
    pub clear_model: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub output: PathBuf,
    pub duration: f64,
    pub cue_count: usize,
}

/// External tools the workflow sequences
pub struct Collaborators {
    pub probe: Arc<dyn DurationProbe>,
    pub extractor: Arc<dyn AudioExtractor>,
    pub transcriber: Arc<dyn Transcriber>,
    pub muxer: Arc<dyn Muxer>,
    pub provisioner: Arc<dyn Provisioner>,
}

impl Collaborators {
    /// ffmpeg, vosk-transcriber and setup implementations built from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let media = Arc::new(FfmpegProcessor::new(config.media.clone()));

        Ok(Self {
            probe: media.clone(),
            extractor: media.clone(),
            transcriber: Arc::new(VoskTranscriber::new(config.transcriber.clone())),
            muxer: media,
            provisioner: Arc::new(SetupManager::new(config)?),
        })
    }
}

pub struct Workflow {
    artifacts: ArtifactPaths,
    collaborators: Collaborators,
}

impl Workflow {
    pub fn new(artifacts: ArtifactPaths, collaborators: Collaborators) -> Self {
        Self {
            artifacts,
            collaborators,
        }
    }

    pub fn artifacts(&self) -> &ArtifactPaths {
        &self.artifacts
    }

    /// Run the whole pipeline for one video.
    ///
    /// The first failing step aborts the run. Intermediate artifacts are only
    /// cleaned up after a successful mux; a failed run leaves them in place.
    pub async fn run(&self, video_path: &Path, options: &RunOptions) -> Result<RunReport> {
        info!("Processing video file: {}", video_path.display());

        if !video_path.exists() {
            return Err(VosubError::FileNotFound(video_path.display().to_string()));
        }

        let artifacts = &self.artifacts;
        let c = &self.collaborators;

        if options.first_use {
            run_step(Step::InstallDependencies, c.provisioner.install_dependencies()).await?;
        }

        let model_dir = if options.download_model || options.clear_model {
            run_step(Step::FetchModel, c.provisioner.fetch_model()).await?
        } else {
            artifacts.model_dir.clone()
        };

        let duration = run_step(Step::Probe, c.probe.probe_duration(video_path)).await?;

        run_step(Step::ExtractAudio, async {
            c.extractor.extract_audio(video_path, &artifacts.audio).await?;
            require_artifact("Audio extraction", &artifacts.audio).await
        })
        .await?;

        run_step(Step::Transcribe, async {
            c.transcriber
                .transcribe(&artifacts.audio, &model_dir, &artifacts.transcript)
                .await?;
            require_non_empty_artifact("Transcription", &artifacts.transcript).await
        })
        .await?;

        let cue_count = run_step(
            Step::Synthesize,
            generate_srt(&artifacts.transcript, &artifacts.subtitles, duration),
        )
        .await?;

        run_step(Step::Mux, async {
            c.muxer
                .embed_subtitles(video_path, &artifacts.subtitles, &artifacts.output)
                .await?;
            require_artifact("Subtitle muxing", &artifacts.output).await
        })
        .await?;

        run_step(Step::Cleanup, async {
            remove_intermediates(artifacts).await?;
            if options.clear_model {
                c.provisioner.clear_model().await?;
            }
            Ok::<_, VosubError>(())
        })
        .await?;

        info!(
            "Wrote {} with {} subtitle cues",
            artifacts.output.display(),
            cue_count
        );

        Ok(RunReport {
            output: artifacts.output.clone(),
            duration,
            cue_count,
        })
    }
}

async fn run_step<T, F>(step: Step, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    info!("Starting step: {}", step);
    match fut.await {
        Ok(value) => {
            info!("Step {} completed", step);
            Ok(value)
        }
        Err(e) => Err(VosubError::StepFailed {
            step,
            source: Box::new(e),
        }),
    }
}

/// A tool that exits cleanly but leaves no file behind still failed
async fn require_artifact(tool: &str, path: &Path) -> Result<()> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(VosubError::external(
            tool,
            format!("expected output {} was not produced", path.display()),
        )),
    }
}

/// Like `require_artifact`, but a zero-byte file also counts as missing
async fn require_non_empty_artifact(tool: &str, path: &Path) -> Result<()> {
    require_artifact(tool, path).await?;
    let meta = fs::metadata(path).await?;
    if meta.len() == 0 {
        return Err(VosubError::external(
            tool,
            format!("output {} is empty", path.display()),
        ));
    }
    Ok(())
}

async fn remove_intermediates(artifacts: &ArtifactPaths) -> Result<()> {
    for path in artifacts.intermediates() {
        match fs::remove_file(path).await {
            Ok(()) => info!("Removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("{} was already removed", path.display())
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MockAudioExtractor, MockDurationProbe, MockMuxer};
    use crate::setup::MockProvisioner;
    use crate::transcribe::MockTranscriber;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use mockall::Sequence;

    struct Fixture {
        temp: TempDir,
        video: PathBuf,
        artifacts: ArtifactPaths,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let video = temp.child("input video.mp4");
            video.touch().unwrap();

            let mut config = Config::default();
            config.artifacts.work_dir = temp.path().to_path_buf();
            config.model.root_dir = temp.path().join("vosk_model");
            let artifacts = ArtifactPaths::from_config(&config, None, None);

            Self {
                video: video.path().to_path_buf(),
                temp,
                artifacts,
            }
        }
    }

    struct Mocks {
        probe: MockDurationProbe,
        extractor: MockAudioExtractor,
        transcriber: MockTranscriber,
        muxer: MockMuxer,
        provisioner: MockProvisioner,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                probe: MockDurationProbe::new(),
                extractor: MockAudioExtractor::new(),
                transcriber: MockTranscriber::new(),
                muxer: MockMuxer::new(),
                provisioner: MockProvisioner::new(),
            }
        }

        fn into_workflow(self, artifacts: ArtifactPaths) -> Workflow {
            Workflow::new(
                artifacts,
                Collaborators {
                    probe: Arc::new(self.probe),
                    extractor: Arc::new(self.extractor),
                    transcriber: Arc::new(self.transcriber),
                    muxer: Arc::new(self.muxer),
                    provisioner: Arc::new(self.provisioner),
                },
            )
        }

        /// Collaborators that behave like working tools
        fn working(duration: f64, transcript: &'static str) -> Self {
            let mut mocks = Self::new();
            mocks.probe.expect_probe_duration().returning(move |_| Ok(duration));
            mocks
                .extractor
                .expect_extract_audio()
                .returning(|_: &Path, audio: &Path| {
                    std::fs::write(audio, b"RIFF").unwrap();
                    Ok(())
                });
            mocks.transcriber.expect_transcribe().returning(
                move |_: &Path, _: &Path, output: &Path| {
                    std::fs::write(output, transcript).unwrap();
                    Ok(())
                },
            );
            mocks
                .muxer
                .expect_embed_subtitles()
                .returning(|_: &Path, _: &Path, output: &Path| {
                    std::fs::write(output, b"video").unwrap();
                    Ok(())
                });
            mocks
        }
    }

    fn failed_step(result: Result<RunReport>) -> (Step, VosubError) {
        match result {
            Err(VosubError::StepFailed { step, source }) => (step, *source),
            other => panic!("expected a step failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_successful_run_embeds_and_cleans_up() {
        let fixture = Fixture::new();
        let mut mocks = Mocks::new();
        let mut seq = Sequence::new();

        mocks
            .probe
            .expect_probe_duration()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(4.0));
        mocks
            .extractor
            .expect_extract_audio()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_: &Path, audio: &Path| {
                std::fs::write(audio, b"RIFF").unwrap();
                Ok(())
            });
        let expected_model = fixture.artifacts.model_dir.clone();
        mocks
            .transcriber
            .expect_transcribe()
            .withf(move |_: &Path, model: &Path, _: &Path| model == expected_model.as_path())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_: &Path, _: &Path, output: &Path| {
                std::fs::write(output, "hello\n\nworld\n").unwrap();
                Ok(())
            });
        mocks
            .muxer
            .expect_embed_subtitles()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_: &Path, subtitles: &Path, output: &Path| {
                let srt = std::fs::read_to_string(subtitles).unwrap();
                assert_eq!(
                    srt,
                    "1\n00:00:00,000 --> 00:00:02,000\nhello\n\n2\n00:00:02,000 --> 00:00:04,000\nworld\n\n"
                );
                std::fs::write(output, b"video").unwrap();
                Ok(())
            });

        let workflow = mocks.into_workflow(fixture.artifacts.clone());
        let report = workflow
            .run(&fixture.video, &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(report.cue_count, 2);
        assert_eq!(report.duration, 4.0);
        assert_eq!(report.output, fixture.temp.path().join("video_with_subtitles.mp4"));
        assert!(report.output.exists());
        for path in fixture.artifacts.intermediates() {
            assert!(!path.exists(), "{} was not removed", path.display());
        }
    }

    #[tokio::test]
    async fn test_missing_video_fails_before_any_step() {
        let fixture = Fixture::new();
        let workflow = Mocks::new().into_workflow(fixture.artifacts.clone());

        let result = workflow
            .run(&fixture.temp.path().join("absent.mp4"), &RunOptions::default())
            .await;

        assert!(matches!(result, Err(VosubError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_probe_failure_aborts_pipeline() {
        let fixture = Fixture::new();
        let mut mocks = Mocks::new();
        mocks
            .probe
            .expect_probe_duration()
            .returning(|_| Err(VosubError::external("Duration probe", "moov atom not found")));

        let workflow = mocks.into_workflow(fixture.artifacts.clone());
        let result = workflow.run(&fixture.video, &RunOptions::default()).await;

        let (step, source) = failed_step(result);
        assert_eq!(step, Step::Probe);
        assert!(source.to_string().contains("moov atom not found"));
        assert!(!fixture.artifacts.audio.exists());
    }

    #[tokio::test]
    async fn test_invalid_duration_reported_by_probe_step() {
        let fixture = Fixture::new();
        let mut mocks = Mocks::new();
        mocks
            .probe
            .expect_probe_duration()
            .returning(|_| Err(VosubError::InvalidDuration("N/A".to_string())));

        let workflow = mocks.into_workflow(fixture.artifacts.clone());
        let result = workflow.run(&fixture.video, &RunOptions::default()).await;
        let (step, source) = failed_step(result);

        assert_eq!(step, Step::Probe);
        assert!(matches!(source, VosubError::InvalidDuration(_)));
    }

    #[tokio::test]
    async fn test_silent_extractor_is_a_failure() {
        let fixture = Fixture::new();
        let mut mocks = Mocks::new();
        mocks.probe.expect_probe_duration().returning(|_| Ok(10.0));
        mocks
            .extractor
            .expect_extract_audio()
            .returning(|_: &Path, _: &Path| Ok(()));

        let workflow = mocks.into_workflow(fixture.artifacts.clone());
        let result = workflow.run(&fixture.video, &RunOptions::default()).await;
        let (step, source) = failed_step(result);

        assert_eq!(step, Step::ExtractAudio);
        assert!(matches!(source, VosubError::ExternalTool { .. }));
    }

    #[tokio::test]
    async fn test_empty_transcript_stops_before_mux_and_keeps_artifacts() {
        let fixture = Fixture::new();
        let mut mocks = Mocks::working(10.0, "\n   \n");
        mocks.muxer.checkpoint();
        mocks.muxer.expect_embed_subtitles().never();

        let workflow = mocks.into_workflow(fixture.artifacts.clone());
        let result = workflow.run(&fixture.video, &RunOptions::default()).await;
        let (step, source) = failed_step(result);

        assert_eq!(step, Step::Synthesize);
        assert!(matches!(source, VosubError::EmptyTranscript));
        assert!(fixture.artifacts.audio.exists());
        assert!(fixture.artifacts.transcript.exists());
        assert!(!fixture.artifacts.subtitles.exists());
    }

    #[tokio::test]
    async fn test_zero_byte_transcript_fails_transcribe_step() {
        let fixture = Fixture::new();
        let mut mocks = Mocks::working(10.0, "");
        mocks.muxer.checkpoint();
        mocks.muxer.expect_embed_subtitles().never();

        let workflow = mocks.into_workflow(fixture.artifacts.clone());
        let result = workflow.run(&fixture.video, &RunOptions::default()).await;
        let (step, source) = failed_step(result);

        assert_eq!(step, Step::Transcribe);
        match source {
            VosubError::ExternalTool { tool, message } => {
                assert_eq!(tool, "Transcription");
                assert!(message.contains("is empty"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!fixture.artifacts.subtitles.exists());
    }

    #[tokio::test]
    async fn test_fetched_model_is_used_and_cleared() {
        let fixture = Fixture::new();
        let mut mocks = Mocks::working(3.0, "un\ndeux\ntrois\n");
        let fetched = fixture.temp.path().join("vosk_model").join("nested-model");
        let returned = fetched.clone();

        mocks
            .provisioner
            .expect_fetch_model()
            .times(1)
            .returning(move || Ok(returned.clone()));
        mocks.provisioner.expect_clear_model().times(1).returning(|| Ok(()));
        mocks.transcriber.checkpoint();
        mocks
            .transcriber
            .expect_transcribe()
            .withf(move |_: &Path, model: &Path, _: &Path| model == fetched.as_path())
            .times(1)
            .returning(|_: &Path, _: &Path, output: &Path| {
                std::fs::write(output, "un\ndeux\ntrois\n").unwrap();
                Ok(())
            });

        let options = RunOptions {
            clear_model: true,
            ..RunOptions::default()
        };
        let workflow = mocks.into_workflow(fixture.artifacts.clone());
        let report = workflow.run(&fixture.video, &options).await.unwrap();

        assert_eq!(report.cue_count, 3);
    }

    #[tokio::test]
    async fn test_download_without_clear_keeps_model() {
        let fixture = Fixture::new();
        let mut mocks = Mocks::working(3.0, "only line\n");
        let model_dir = fixture.artifacts.model_dir.clone();
        mocks
            .provisioner
            .expect_fetch_model()
            .times(1)
            .returning(move || Ok(model_dir.clone()));
        mocks.provisioner.expect_clear_model().never();

        let options = RunOptions {
            download_model: true,
            ..RunOptions::default()
        };
        let workflow = mocks.into_workflow(fixture.artifacts.clone());
        workflow.run(&fixture.video, &options).await.unwrap();
    }

    #[tokio::test]
    async fn test_install_failure_aborts_before_probe() {
        let fixture = Fixture::new();
        let mut mocks = Mocks::new();
        mocks
            .provisioner
            .expect_install_dependencies()
            .times(1)
            .returning(|| Err(VosubError::external("Dependency installation", "pip3 not found")));
        mocks.probe.expect_probe_duration().never();

        let options = RunOptions {
            first_use: true,
            ..RunOptions::default()
        };
        let workflow = mocks.into_workflow(fixture.artifacts.clone());
        let (step, _) = failed_step(workflow.run(&fixture.video, &options).await);

        assert_eq!(step, Step::InstallDependencies);
    }

    #[test]
    fn test_run_id_suffixes_intermediates_only() {
        let config = Config::default();
        let paths = ArtifactPaths::from_config(&config, Some(Path::new("out.mkv")), Some("abc123"));

        assert_eq!(paths.audio, PathBuf::from(".").join("output_audio-abc123.wav"));
        assert_eq!(paths.transcript, PathBuf::from(".").join("transcribed_text-abc123.txt"));
        assert_eq!(paths.subtitles, PathBuf::from(".").join("subtitles-abc123.srt"));
        assert_eq!(paths.output, PathBuf::from("out.mkv"));
        assert_eq!(paths.model_dir, PathBuf::from("vosk_model").join("vosk-model-fr-0.22"));
    }

    #[test]
    fn test_run_ids_differ() {
        assert_ne!(new_run_id(), new_run_id());
    }

    #[test]
    fn test_step_names() {
        assert_eq!(Step::ExtractAudio.to_string(), "extract-audio");
        let err = VosubError::StepFailed {
            step: Step::Mux,
            source: Box::new(VosubError::external("Subtitle muxing", "invalid argument")),
        };
        assert_eq!(err.step(), Some(Step::Mux));
        assert_eq!(
            err.to_string(),
            "Step 'mux' failed: Subtitle muxing failed: invalid argument"
        );
    }
}
