//! Tool availability checker
//!
//! Resolves the build tool and deploy CLI on the search path and, when a
//! version requirement is configured, validates the installed version.

use crate::env::EnvSnapshot;
use crate::error::{
    DependencyMissingSnafu, DependencyOutdatedSnafu, Error, ProcessError, VersionProbeSnafu,
};
use crate::process::{self, CommandLine};
use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use snafu::IntoError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

/// A tool that must be present before the pipeline runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    /// Format: ">=1.0.0"
    pub version: Option<String>,
    pub install_hint: String,
}

/// Result of checking a single tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolCheck {
    pub name: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_version: Option<String>,
    pub meets_requirement: bool,
    #[serde(skip)]
    pub install_hint: String,
}

impl ToolCheck {
    pub fn is_ready(&self) -> bool {
        self.found && self.meets_requirement
    }
}

/// Read-only view of the execution search path
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ToolProbe: Send + Sync {
    /// Resolve a tool name to an executable path
    fn locate(&self, name: &str) -> Option<PathBuf>;

    /// Raw `--version` output of a resolved tool; `None` when it cannot be read
    async fn version_output(&self, path: &Path) -> Result<Option<String>, ProcessError>;
}

/// Probe backed by the `PATH` value of an [`EnvSnapshot`]
#[derive(Debug, Clone)]
pub struct PathProbe {
    search_path: Option<OsString>,
    dir: PathBuf,
    timeout: Option<Duration>,
}

impl PathProbe {
    pub fn new(search_path: Option<OsString>) -> Self {
        Self {
            search_path,
            dir: PathBuf::from("."),
            timeout: None,
        }
    }

    pub fn from_env(env: &EnvSnapshot) -> Self {
        Self::new(env.search_path().map(OsString::from))
    }

    /// Directory the `--version` query runs in
    #[must_use]
    pub fn in_dir(mut self, dir: PathBuf) -> Self {
        self.dir = dir;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ToolProbe for PathProbe {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        if name.contains(std::path::MAIN_SEPARATOR) {
            let candidate = PathBuf::from(name);
            return is_executable(&candidate).then_some(candidate);
        }

        let search_path = self.search_path.as_ref()?;
        std::env::split_paths(search_path)
            .map(|dir| dir.join(name))
            .find(|candidate| is_executable(candidate))
    }

    async fn version_output(&self, path: &Path) -> Result<Option<String>, ProcessError> {
        let command = CommandLine::new(path.to_string_lossy()).arg("--version");
        let captured = match process::run_quiet(&command, &self.dir, self.timeout).await {
            Ok(captured) => captured,
            Err(err @ ProcessError::TimedOut { .. }) => return Err(err),
            Err(err) => {
                tracing::debug!("version query failed: {err}");
                return Ok(None);
            }
        };
        if !captured.status.success() {
            return Ok(None);
        }

        // Some tools print their version on stderr
        if captured.stdout.trim().is_empty() {
            Ok(Some(captured.stderr))
        } else {
            Ok(Some(captured.stdout))
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Extract semantic version from version output
/// Handles various formats:
///   "GNU Make 4.3" -> "4.3.0"
///   "soroban 20.0.0-rc2 (abc123)" -> "20.0.0"
///   "cargo 1.75.0 (1d8b05cdd 2023-11-20)" -> "1.75.0"
fn extract_version(output: &str) -> Option<String> {
    let re = regex::Regex::new(r"v?(\d+)\.(\d+)(?:\.(\d+))?").ok()?;
    let cap = re.captures(output)?;
    let patch = cap.get(3).map_or("0", |m| m.as_str());
    Some(format!("{}.{}.{}", &cap[1], &cap[2], patch))
}

/// Check if installed version meets requirement
/// Parses requirement like ">=1.0.0" and compares versions
fn version_meets_requirement(installed: &str, requirement: &str) -> anyhow::Result<bool> {
    let requirement = requirement.trim();

    let (op, required_ver_str) = [">=", "<=", ">", "<", "="]
        .iter()
        .find_map(|op| requirement.strip_prefix(op).map(|rest| (*op, rest)))
        .unwrap_or(("=", requirement));

    let installed_ver = semver::Version::parse(installed.trim())
        .with_context(|| format!("Failed to parse installed version: {installed}"))?;

    let required_ver = semver::Version::parse(required_ver_str.trim())
        .with_context(|| format!("Failed to parse required version: {required_ver_str}"))?;

    Ok(match op {
        ">=" => installed_ver >= required_ver,
        "<=" => installed_ver <= required_ver,
        ">" => installed_ver > required_ver,
        "<" => installed_ver < required_ver,
        _ => installed_ver == required_ver,
    })
}

/// Check a single tool against its requirement
pub async fn check_tool(probe: &impl ToolProbe, spec: &ToolSpec) -> Result<ToolCheck, Error> {
    let path = probe.locate(&spec.name);
    let found = path.is_some();

    let (installed_version, meets_requirement) = match (&path, &spec.version) {
        (None, _) => (None, false),
        // No requirement: presence is enough, skip running the tool
        (Some(_), None) => (None, true),
        (Some(path), Some(requirement)) => {
            let output = probe
                .version_output(path)
                .await
                .map_err(|source| VersionProbeSnafu { tool: &spec.name }.into_error(source))?;
            match output.as_deref().and_then(extract_version) {
                Some(version) => {
                    let meets = version_meets_requirement(&version, requirement).unwrap_or_else(
                        |err| {
                            tracing::warn!(tool = %spec.name, "{err:#}");
                            false
                        },
                    );
                    (Some(version), meets)
                }
                // 🤓 Tool found but version unknown - assume OK
                None => (Some("unknown".to_string()), true),
            }
        }
    };

    tracing::debug!(
        tool = %spec.name,
        found,
        meets_requirement,
        path = ?path,
        "checked tool"
    );

    Ok(ToolCheck {
        name: spec.name.clone(),
        found,
        path,
        installed_version,
        required_version: spec.version.clone(),
        meets_requirement,
        install_hint: spec.install_hint.clone(),
    })
}

/// Check every tool in order, stopping at the first one that is not ready
pub async fn check_all(
    probe: &impl ToolProbe,
    specs: &[ToolSpec],
) -> Result<Vec<ToolCheck>, Error> {
    let mut checks = Vec::with_capacity(specs.len());

    for spec in specs {
        let check = check_tool(probe, spec).await?;
        if !check.found {
            return DependencyMissingSnafu {
                tool: check.name,
                hint: check.install_hint,
            }
            .fail();
        }
        if !check.meets_requirement {
            return DependencyOutdatedSnafu {
                tool: check.name,
                installed: check.installed_version.unwrap_or_default(),
                required: check.required_version.unwrap_or_default(),
                hint: check.install_hint,
            }
            .fail();
        }
        checks.push(check);
    }

    Ok(checks)
}
