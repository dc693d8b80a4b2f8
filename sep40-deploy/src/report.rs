//! Terminal output and the optional deployment report
//!
//! - One green line on stdout for a successful deploy
//! - One red line on stderr for any failure
//! - `--report <path>` writes a TOML record of the run (never the secret)

use crate::error::Error;
use crate::orchestrator::Deployment;
use crate::preflight::ToolCheck;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Print the contract identifier on success
pub fn report_success(out: &mut dyn Write, deployment: &Deployment) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        format!("Deployed contract ID: {}", deployment.contract_id).green()
    )
}

/// Print the one-line error message for a failed run
pub fn report_failure(err: &mut dyn Write, error: &Error) -> io::Result<()> {
    writeln!(err, "{}", format!("Error: {error}").red())
}

#[derive(Debug, Serialize)]
pub struct DeploymentReport {
    pub meta: ReportMeta,
    pub deployment: DeploymentSection,
    pub tools: Vec<ToolCheck>,
}

#[derive(Debug, Serialize)]
pub struct ReportMeta {
    pub timestamp: String,
    pub tool_version: String,
}

#[derive(Debug, Serialize)]
pub struct DeploymentSection {
    pub network: String,
    pub contract_id: String,
    pub artifact: String,
}

/// Build the report for a finished deployment
pub fn generate_report(deployment: &Deployment) -> DeploymentReport {
    DeploymentReport {
        meta: ReportMeta {
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        deployment: DeploymentSection {
            network: deployment.network.to_string(),
            contract_id: deployment.contract_id.to_string(),
            artifact: deployment.artifact.display().to_string(),
        },
        tools: deployment.tools.clone(),
    }
}

/// Write the report as TOML, creating parent directories as needed
pub fn write_report(report: &DeploymentReport, output_path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(report).context("Failed to serialize deploy report")?;

    let final_path = crate::config::expand_path(output_path);
    if let Some(parent) = final_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent directory: {}", parent.display()))?;
    }

    fs::write(&final_path, content)
        .with_context(|| format!("Failed to write deploy report to {}", final_path.display()))?;
    tracing::debug!(path = %final_path.display(), "wrote deploy report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContractId, Network};
    use std::path::PathBuf;

    fn deployment() -> Deployment {
        Deployment {
            network: Network::new("testnet"),
            contract_id: ContractId::parse("CABC123\n").unwrap(),
            artifact: PathBuf::from("contract/oracle.wasm"),
            tools: vec![ToolCheck {
                name: "soroban".to_string(),
                found: true,
                path: Some(PathBuf::from("/usr/bin/soroban")),
                installed_version: Some("20.1.0".to_string()),
                required_version: Some(">=20.0.0".to_string()),
                meets_requirement: true,
                install_hint: "cargo install soroban-cli".to_string(),
            }],
        }
    }

    #[test]
    fn test_success_line() {
        let mut out = Vec::new();
        report_success(&mut out, &deployment()).unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("Deployed contract ID: CABC123"));
        assert!(rendered.ends_with('\n'));
        assert_eq!(rendered.lines().count(), 1);
    }

    #[test]
    fn test_failure_line() {
        let mut err = Vec::new();
        report_failure(&mut err, &Error::EmptyNetwork).unwrap();
        let rendered = String::from_utf8(err).unwrap();
        assert!(rendered.contains("Error: network name must not be empty"));
        assert_eq!(rendered.lines().count(), 1);
    }

    /// Writer whose reader has gone away
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_errors_reach_the_caller() {
        let err = report_failure(&mut ClosedPipe, &Error::EmptyNetwork).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(report_success(&mut ClosedPipe, &deployment()).is_err());
    }

    #[test]
    fn test_report_is_written_as_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/deploy.toml");

        write_report(&generate_report(&deployment()), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: toml::Value = toml::from_str(&content).unwrap();
        assert_eq!(parsed["deployment"]["contract_id"].as_str(), Some("CABC123"));
        assert_eq!(parsed["deployment"]["network"].as_str(), Some("testnet"));
        assert_eq!(parsed["tools"][0]["name"].as_str(), Some("soroban"));
        assert!(parsed["meta"]["timestamp"].is_str());
        // install hints stay out of the report
        assert!(!content.contains("cargo install"));
    }
}
