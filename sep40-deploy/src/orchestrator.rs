//! Deploy orchestrator - runs the pipeline stages in order
//!
//! `Validate → CheckDependency → Build → VerifyArtifact → Deploy`. Any failure
//! skips the remaining stages.

use crate::builder::Builder;
use crate::config::DeployConfig;
use crate::deployer::Deployer;
use crate::env::EnvSnapshot;
use crate::error::{ArtifactMissingSnafu, Error};
use crate::preflight::{self, ToolCheck, ToolProbe};
use crate::types::{ContractId, Network};
use snafu::ensure;
use std::path::PathBuf;

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct Deployment {
    pub network: Network,
    pub contract_id: ContractId,
    pub artifact: PathBuf,
    pub tools: Vec<ToolCheck>,
}

/// Orchestrator owns the configuration and the three external collaborators
pub struct Orchestrator<P, B, D> {
    config: DeployConfig,
    probe: P,
    builder: B,
    deployer: D,
}

impl<P, B, D> Orchestrator<P, B, D>
where
    P: ToolProbe,
    B: Builder,
    D: Deployer,
{
    pub fn new(config: DeployConfig, probe: P, builder: B, deployer: D) -> Self {
        Self {
            config,
            probe,
            builder,
            deployer,
        }
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Run the full pipeline for one invocation
    pub async fn run(&self, args: &[String], env: &EnvSnapshot) -> Result<Deployment, Error> {
        let invocation = preflight::validate_invocation(args, env, &self.config.secret_env)?;
        tracing::debug!(network = %invocation.network, "validated invocation");

        let tools = preflight::check_all(&self.probe, &self.config.required_tools()).await?;

        self.builder.build().await?;

        let artifact = self.config.artifact_path();
        if self.config.verify_artifact {
            ensure!(artifact.is_file(), ArtifactMissingSnafu { path: &artifact });
        } else {
            tracing::debug!(path = %artifact.display(), "skipping artifact check");
        }

        let contract_id = self
            .deployer
            .deploy(&artifact, &invocation.secret, &invocation.network)
            .await?;

        Ok(Deployment {
            network: invocation.network,
            contract_id,
            artifact,
            tools,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MockBuilder;
    use crate::deployer::MockDeployer;
    use crate::error::{BuildError, DeployError, ErrorKind};
    use crate::preflight::MockToolProbe;
    use std::path::Path;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn env() -> EnvSnapshot {
        EnvSnapshot::from_pairs([("SOURCE_SECRET", "S123")])
    }

    /// Project dir containing the default artifact
    fn project_with_artifact() -> (tempfile::TempDir, DeployConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = DeployConfig {
            project_dir: dir.path().to_path_buf(),
            artifact: PathBuf::from("oracle.wasm"),
            ..DeployConfig::default()
        };
        std::fs::write(config.artifact_path(), b"\0asm").unwrap();
        (dir, config)
    }

    fn probe_all_present() -> MockToolProbe {
        let mut probe = MockToolProbe::new();
        probe
            .expect_locate()
            .returning(|name| Some(PathBuf::from("/usr/bin").join(name)));
        probe.expect_version_output().never();
        probe
    }

    fn untouched_builder() -> MockBuilder {
        let mut builder = MockBuilder::new();
        builder.expect_build().never();
        builder
    }

    fn untouched_deployer() -> MockDeployer {
        let mut deployer = MockDeployer::new();
        deployer.expect_deploy().never();
        deployer
    }

    #[tokio::test]
    async fn test_successful_run() {
        let (_dir, config) = project_with_artifact();
        let expected_artifact = config.artifact_path();

        let mut builder = MockBuilder::new();
        builder.expect_build().times(1).returning(|| Ok(()));

        let mut deployer = MockDeployer::new();
        deployer
            .expect_deploy()
            .withf(move |artifact, secret, network| {
                artifact == expected_artifact.as_path()
                    && secret.expose() == "S123"
                    && network.as_str() == "testnet"
            })
            .times(1)
            .returning(|_, _, _| Ok(ContractId::parse("CABC123").unwrap()));

        let orchestrator = Orchestrator::new(config, probe_all_present(), builder, deployer);
        let deployment = orchestrator.run(&args(&["testnet"]), &env()).await.unwrap();

        assert_eq!(deployment.contract_id.as_str(), "CABC123");
        assert_eq!(deployment.network.as_str(), "testnet");
        assert_eq!(deployment.tools.len(), 2);
    }

    #[tokio::test]
    async fn test_usage_error_spawns_nothing() {
        for bad in [args(&[]), args(&["testnet", "extra"])] {
            let mut probe = MockToolProbe::new();
            probe.expect_locate().never();

            let orchestrator = Orchestrator::new(
                DeployConfig::default(),
                probe,
                untouched_builder(),
                untouched_deployer(),
            );
            let err = orchestrator.run(&bad, &env()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Usage);
        }
    }

    #[tokio::test]
    async fn test_missing_secret_skips_build() {
        let orchestrator = Orchestrator::new(
            DeployConfig::default(),
            MockToolProbe::new(),
            untouched_builder(),
            untouched_deployer(),
        );
        let err = orchestrator
            .run(&args(&["testnet"]), &EnvSnapshot::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_missing_build_tool_skips_build_and_deploy() {
        let mut probe = MockToolProbe::new();
        probe.expect_locate().returning(|_| None);

        let orchestrator = Orchestrator::new(
            DeployConfig::default(),
            probe,
            untouched_builder(),
            untouched_deployer(),
        );
        let err = orchestrator.run(&args(&["testnet"]), &env()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyMissing);
        assert!(err.to_string().contains("`make`"));
        assert!(err.to_string().contains("gnu.org/software/make"));
    }

    #[tokio::test]
    async fn test_failed_build_skips_deploy() {
        let (_dir, config) = project_with_artifact();
        let mut builder = MockBuilder::new();
        builder.expect_build().times(1).returning(|| {
            Err(BuildError::Exited {
                program: "make".to_string(),
                code: Some(2),
            })
        });

        let orchestrator =
            Orchestrator::new(config, probe_all_present(), builder, untouched_deployer());
        let err = orchestrator.run(&args(&["testnet"]), &env()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Build);
    }

    #[tokio::test]
    async fn test_missing_artifact_skips_deploy() {
        let dir = tempfile::tempdir().unwrap();
        let config = DeployConfig {
            project_dir: dir.path().to_path_buf(),
            ..DeployConfig::default()
        };
        let mut builder = MockBuilder::new();
        builder.expect_build().times(1).returning(|| Ok(()));

        let orchestrator =
            Orchestrator::new(config, probe_all_present(), builder, untouched_deployer());
        let err = orchestrator.run(&args(&["testnet"]), &env()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArtifactMissing);
        assert!(err.to_string().ends_with("oracle.wasm"));
    }

    #[tokio::test]
    async fn test_artifact_check_can_be_disabled() {
        let config = DeployConfig {
            project_dir: PathBuf::from("/nonexistent/project"),
            verify_artifact: false,
            ..DeployConfig::default()
        };
        let mut builder = MockBuilder::new();
        builder.expect_build().times(1).returning(|| Ok(()));
        let mut deployer = MockDeployer::new();
        deployer
            .expect_deploy()
            .times(1)
            .returning(|_, _, _| Ok(ContractId::parse("CXYZ").unwrap()));

        let orchestrator = Orchestrator::new(config, probe_all_present(), builder, deployer);
        let deployment = orchestrator.run(&args(&["mainnet"]), &env()).await.unwrap();
        assert_eq!(
            deployment.artifact,
            Path::new("/nonexistent/project").join(crate::config::DEFAULT_ARTIFACT)
        );
    }

    #[tokio::test]
    async fn test_empty_identifier_fails_run() {
        let (_dir, config) = project_with_artifact();
        let mut builder = MockBuilder::new();
        builder.expect_build().returning(|| Ok(()));
        let mut deployer = MockDeployer::new();
        deployer.expect_deploy().times(1).returning(|_, _, _| {
            Err(DeployError::EmptyIdentifier {
                program: "soroban".to_string(),
            })
        });

        let orchestrator = Orchestrator::new(config, probe_all_present(), builder, deployer);
        let err = orchestrator.run(&args(&["testnet"]), &env()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Deploy);
        assert_eq!(err.exit_code(), 1);
    }
}
