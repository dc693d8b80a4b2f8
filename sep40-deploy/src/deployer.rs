//! Deploy stage: publishes the artifact through the deploy CLI

use crate::config::{DeployConfig, DeploySpec};
use crate::env::Secret;
use crate::error::{DeployError, EmptyIdentifierSnafu, FailedSnafu};
use crate::process::{self, CommandLine};
use crate::types::{ContractId, Network};
use async_trait::async_trait;
use snafu::{OptionExt, ensure};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Deployer {
    /// Publish `artifact` to `network`, returning the new contract identifier
    async fn deploy(
        &self,
        artifact: &Path,
        secret: &Secret,
        network: &Network,
    ) -> Result<ContractId, DeployError>;
}

/// Deployer backed by an external CLI such as `soroban contract deploy`
#[derive(Debug, Clone)]
pub struct CliDeployer {
    spec: DeploySpec,
    project_dir: PathBuf,
    timeout: Option<Duration>,
}

impl CliDeployer {
    pub fn new(spec: DeploySpec, project_dir: PathBuf, timeout: Option<Duration>) -> Self {
        Self {
            spec,
            project_dir,
            timeout,
        }
    }

    pub fn from_config(config: &DeployConfig) -> Self {
        Self::new(
            config.deploy.clone(),
            config.project_dir.clone(),
            config.timeout,
        )
    }

    fn command_line(&self, artifact: &Path, secret: &Secret, network: &Network) -> CommandLine {
        CommandLine::new(&self.spec.program)
            .args(&self.spec.args)
            .arg(&self.spec.wasm_flag)
            .arg(artifact)
            .arg(&self.spec.source_flag)
            .secret_arg(secret)
            .arg(&self.spec.network_flag)
            .arg(network.as_str())
    }
}

#[async_trait]
impl Deployer for CliDeployer {
    async fn deploy(
        &self,
        artifact: &Path,
        secret: &Secret,
        network: &Network,
    ) -> Result<ContractId, DeployError> {
        let command = self.command_line(artifact, secret, network);
        tracing::info!(%command, "🚀 deploying contract");

        let captured = process::run_captured(&command, &self.project_dir, self.timeout).await?;
        ensure!(
            captured.status.success(),
            FailedSnafu {
                program: command.program(),
                code: captured.status.code(),
            }
        );

        // 🤓 Exit code 0 with blank output is still a failed deploy
        let contract_id = ContractId::parse(&captured.stdout).context(EmptyIdentifierSnafu {
            program: command.program(),
        })?;
        tracing::info!(%contract_id, %network, "deployed");
        Ok(contract_id)
    }
}
