//! Build stage: runs the configured build tool in the project directory

use crate::config::DeployConfig;
use crate::error::{BuildError, ExitedSnafu};
use crate::process::{self, CommandLine};
use async_trait::async_trait;
use snafu::ensure;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Builder {
    /// Produce the contract artifact; output streams straight to the terminal
    async fn build(&self) -> Result<(), BuildError>;
}

/// Builder that shells out to an external build tool
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    command: CommandLine,
    project_dir: PathBuf,
    timeout: Option<Duration>,
}

impl CommandBuilder {
    pub fn new(command: CommandLine, project_dir: PathBuf, timeout: Option<Duration>) -> Self {
        Self {
            command,
            project_dir,
            timeout,
        }
    }

    pub fn from_config(config: &DeployConfig) -> Self {
        Self::new(
            CommandLine::new(&config.build.program).args(&config.build.args),
            config.project_dir.clone(),
            config.timeout,
        )
    }
}

#[async_trait]
impl Builder for CommandBuilder {
    async fn build(&self) -> Result<(), BuildError> {
        tracing::info!(command = %self.command, "🔨 building contract");
        let status =
            process::run_inherited(&self.command, &self.project_dir, self.timeout).await?;

        ensure!(
            status.success(),
            ExitedSnafu {
                program: self.command.program(),
                code: status.code(),
            }
        );
        tracing::info!("✅ build succeeded");
        Ok(())
    }
}
