//! Deploy command for the `sep40-deploy` binary
//!
//! - Capture the environment snapshot (process env over the dotenv file)
//! - Load `deploy.toml` and apply CLI overrides
//! - Run the orchestrator and print the outcome
//! - Optionally write the deployment report

use crate::builder::CommandBuilder;
use crate::cli::DeployArgs;
use crate::config::DeployConfig;
use crate::deployer::CliDeployer;
use crate::env::EnvSnapshot;
use crate::error::Error;
use crate::orchestrator::{Deployment, Orchestrator};
use crate::preflight::PathProbe;
use crate::report::{generate_report, report_failure, report_success, write_report};
use std::io;
use std::process::ExitCode;

/// Handle the deploy command, mapping the outcome to the process exit code
pub async fn handle_deploy_command(args: DeployArgs) -> ExitCode {
    match run_deploy(&args).await {
        Ok(deployment) => {
            if let Err(e) = report_success(&mut io::stdout().lock(), &deployment) {
                tracing::warn!("failed to print contract id: {e}");
            }
            if let Some(path) = &args.report {
                // The contract is live at this point, so a report failure only warns
                if let Err(e) = write_report(&generate_report(&deployment), path) {
                    tracing::warn!("{e:#}");
                }
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::debug!(kind = ?error.kind(), "deploy failed");
            if let Err(e) = report_failure(&mut io::stderr().lock(), &error) {
                tracing::warn!("failed to print error: {e}");
            }
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run_deploy(args: &DeployArgs) -> Result<Deployment, Error> {
    let (env_file, env_file_required) = args.env_file_path();
    let env = EnvSnapshot::capture_with_env_file(&env_file, env_file_required)?;
    tracing::debug!(?env, "captured environment");

    let (config_path, config_required) = args.config_path();
    let config =
        apply_overrides(DeployConfig::load(&config_path, config_required)?, args).resolve_paths()?;
    tracing::debug!(project_dir = %config.project_dir.display(), "resolved project directory");

    let probe = PathProbe::from_env(&env)
        .in_dir(config.project_dir.clone())
        .with_timeout(config.timeout);
    let orchestrator = Orchestrator::new(
        config.clone(),
        probe,
        CommandBuilder::from_config(&config),
        CliDeployer::from_config(&config),
    );
    orchestrator.run(&args.networks, &env).await
}

/// CLI flags win over the config file
fn apply_overrides(mut config: DeployConfig, args: &DeployArgs) -> DeployConfig {
    if let Some(dir) = &args.project_dir {
        config.project_dir = crate::config::expand_path(dir);
    }
    if args.timeout.is_some() {
        config.timeout = args.timeout;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn args() -> DeployArgs {
        DeployArgs {
            networks: vec!["testnet".to_string()],
            config: None,
            env_file: None,
            project_dir: None,
            timeout: None,
            report: None,
        }
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let config = DeployConfig {
            timeout: Some(Duration::from_secs(600)),
            ..DeployConfig::default()
        };
        let args = DeployArgs {
            project_dir: Some(PathBuf::from("/srv/oracle")),
            timeout: Some(Duration::from_secs(5)),
            ..args()
        };

        let config = apply_overrides(config, &args);
        assert_eq!(config.project_dir, PathBuf::from("/srv/oracle"));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_absent_overrides_keep_config_values() {
        let config = DeployConfig {
            timeout: Some(Duration::from_secs(600)),
            project_dir: PathBuf::from("sep40"),
            ..DeployConfig::default()
        };

        let config = apply_overrides(config, &args());
        assert_eq!(config.project_dir, PathBuf::from("sep40"));
        assert_eq!(config.timeout, Some(Duration::from_secs(600)));
    }

    #[tokio::test]
    async fn test_explicit_missing_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = DeployArgs {
            config: Some(dir.path().join("absent.toml")),
            env_file: None,
            ..args()
        };

        let err = run_deploy(&args).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }
}
