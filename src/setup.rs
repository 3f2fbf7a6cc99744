use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::command::ToolCommand;
use crate::config::{Config, ModelConfig, SetupConfig};
use crate::error::{Result, VosubError};
use crate::media::MediaCommandBuilder;

const MODEL_ARCHIVE: &str = "model.zip";

/// Preparation steps that run around the pipeline
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Install the packages the pipeline shells out to
    async fn install_dependencies(&self) -> Result<()>;

    /// Download and unpack the speech model, returning its directory
    async fn fetch_model(&self) -> Result<PathBuf>;

    /// Remove the model directory tree
    async fn clear_model(&self) -> Result<()>;
}

pub struct SetupManager {
    client: Client,
    model: ModelConfig,
    setup: SetupConfig,
    media_commands: MediaCommandBuilder,
}

impl SetupManager {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("vosub/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            model: config.model.clone(),
            setup: config.setup.clone(),
            media_commands: MediaCommandBuilder::new(config.media.clone()),
        })
    }

    fn install_command(&self) -> ToolCommand {
        ToolCommand::new(&self.setup.pip_path, "Dependency installation")
            .arg("install")
            .args(self.setup.packages.iter().cloned())
    }

    fn unzip_command(&self, archive: &Path) -> ToolCommand {
        ToolCommand::new(&self.model.unzip_path, "Model extraction")
            .arg("-o")
            .path(archive)
            .arg("-d")
            .path(&self.model.root_dir)
    }

    async fn download(&self, url: &str, target: &Path) -> Result<()> {
        info!("Downloading {} to {}", url, target.display());

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(VosubError::external(
                "Model download",
                format!("HTTP {} for {}", response.status(), url),
            ));
        }

        // Partial downloads never reach `target`
        let temp_path = target.with_extension("tmp");
        if let Err(e) = write_response(response, &temp_path).await {
            if let Err(remove_err) = fs::remove_file(&temp_path).await {
                if remove_err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", temp_path.display(), remove_err);
                }
            }
            return Err(e);
        }

        fs::rename(&temp_path, target).await?;
        Ok(())
    }
}

async fn write_response(mut response: Response, path: &Path) -> Result<()> {
    let pb = ProgressBar::new(response.content_length().unwrap_or(0));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .map_err(|e| VosubError::Config(format!("Invalid progress template: {}", e)))?
            .progress_chars("#>-"),
    );

    let mut file = fs::File::create(path).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;

    pb.finish_with_message("Downloaded model archive");
    Ok(())
}

/// Find the unpacked model directory named `name` below `root`
pub fn locate_model_dir(root: &Path, name: &str) -> Result<PathBuf> {
    let direct = root.join(name);
    if direct.is_dir() {
        return Ok(direct);
    }

    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|entry| entry.file_type().is_dir() && entry.file_name() == name)
        .map(|entry| entry.into_path())
        .ok_or_else(|| {
            VosubError::external(
                "Model extraction",
                format!("no directory named {} under {}", name, root.display()),
            )
        })
}

#[async_trait]
impl Provisioner for SetupManager {
    async fn install_dependencies(&self) -> Result<()> {
        info!("Installing dependencies: {}", self.setup.packages.join(", "));
        self.install_command().execute().await?;

        for command in self.media_commands.version_checks() {
            command.execute().await?;
        }

        info!("Dependencies installed");
        Ok(())
    }

    async fn fetch_model(&self) -> Result<PathBuf> {
        let root = &self.model.root_dir;
        fs::create_dir_all(root).await?;

        let archive = root.join(MODEL_ARCHIVE);
        self.download(&self.model.url, &archive).await?;

        info!("Extracting {}", archive.display());
        self.unzip_command(&archive).execute().await?;
        fs::remove_file(&archive).await?;

        let model_dir = locate_model_dir(root, &self.model.name)?;
        info!("Model ready at {}", model_dir.display());
        Ok(model_dir)
    }

    async fn clear_model(&self) -> Result<()> {
        let root = &self.model.root_dir;
        match fs::remove_dir_all(root).await {
            Ok(()) => {
                info!("Removed model directory {}", root.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Model directory {} already absent", root.display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
