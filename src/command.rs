use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, VosubError};

/// External tool invocation built from an argument vector, never a shell string
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl ToolCommand {
    /// Create a new tool command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add a path argument
    pub fn path<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Run to completion and return captured stdout
    pub async fn run(&self) -> Result<Vec<u8>> {
        debug!("Executing {}: {} {:?}", self.description, self.binary_path, self.args);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| {
                VosubError::external(
                    &self.description,
                    format!("failed to execute {}: {}", self.binary_path, e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VosubError::external(
                &self.description,
                format!("{} ({})", stderr.trim(), output.status),
            ));
        }

        Ok(output.stdout)
    }

    /// Run to completion, discarding output
    pub async fn execute(&self) -> Result<()> {
        self.run().await.map(|_| ())
    }
}
