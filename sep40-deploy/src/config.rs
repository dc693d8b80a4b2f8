//! Deploy configuration loaded from `deploy.toml`
//!
//! Every key is optional; the defaults build the oracle contract with `make`
//! and publish it with `soroban contract deploy`.

use crate::error::{Error, ParseConfigSnafu, ProjectDirSnafu, ReadConfigSnafu};
use crate::preflight::ToolSpec;
use serde::{Deserialize, Deserializer};
use snafu::ResultExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "deploy.toml";
pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_SECRET_ENV: &str = "SOURCE_SECRET";
pub const DEFAULT_ARTIFACT: &str = "contract/target/wasm32-unknown-unknown/release/oracle.wasm";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    /// Environment variable holding the deployment secret
    pub secret_env: String,
    /// Working directory for both subprocesses
    pub project_dir: PathBuf,
    /// Build output handed to the deploy CLI, relative to `project_dir`
    pub artifact: PathBuf,
    /// Fail with a distinct error when the build leaves no artifact behind
    pub verify_artifact: bool,
    /// Per-subprocess limit; `None` waits indefinitely
    #[serde(deserialize_with = "deserialize_timeout")]
    pub timeout: Option<Duration>,
    pub build: BuildSpec,
    pub deploy: DeploySpec,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSpec {
    pub program: String,
    pub args: Vec<String>,
    pub install_hint: String,
    /// Optional semver requirement, e.g. ">=4.0.0"
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeploySpec {
    pub program: String,
    /// Leading arguments, before the artifact/secret/network flags
    pub args: Vec<String>,
    pub wasm_flag: String,
    pub source_flag: String,
    pub network_flag: String,
    pub install_hint: String,
    pub version: Option<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            secret_env: DEFAULT_SECRET_ENV.to_string(),
            project_dir: PathBuf::from("."),
            artifact: PathBuf::from(DEFAULT_ARTIFACT),
            verify_artifact: true,
            timeout: None,
            build: BuildSpec::default(),
            deploy: DeploySpec::default(),
        }
    }
}

impl Default for BuildSpec {
    fn default() -> Self {
        Self {
            program: "make".to_string(),
            args: Vec::new(),
            install_hint: "install GNU make (https://www.gnu.org/software/make/) \
                           or set [build].program in deploy.toml"
                .to_string(),
            version: None,
        }
    }
}

impl Default for DeploySpec {
    fn default() -> Self {
        Self {
            program: "soroban".to_string(),
            args: vec!["contract".to_string(), "deploy".to_string()],
            wasm_flag: "--wasm".to_string(),
            source_flag: "--source".to_string(),
            network_flag: "--network".to_string(),
            install_hint: "install the Soroban CLI with `cargo install --locked soroban-cli` \
                           (https://soroban.stellar.org/docs/getting-started/setup)"
                .to_string(),
            version: None,
        }
    }
}

impl DeployConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file falls back to defaults unless `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self, Error> {
        let path = expand_path(path);
        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).context(ReadConfigSnafu { path: &path })?;
        let mut config = Self::from_toml_str(&content).context(ParseConfigSnafu { path: &path })?;
        config.project_dir = expand_path(&config.project_dir);
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Make `project_dir` absolute and resolve relative program paths against it.
    ///
    /// Children run inside `project_dir`; every relative path is read from there.
    pub fn resolve_paths(mut self) -> Result<Self, Error> {
        let project_dir = std::path::absolute(&self.project_dir).context(ProjectDirSnafu {
            path: &self.project_dir,
        })?;
        self.build.program = resolve_program(&project_dir, &self.build.program);
        self.deploy.program = resolve_program(&project_dir, &self.deploy.program);
        self.project_dir = project_dir;
        Ok(self)
    }

    /// Artifact location as seen from the invoking process
    pub fn artifact_path(&self) -> PathBuf {
        self.project_dir.join(&self.artifact)
    }

    /// Tools that must be present before anything runs, build tool first
    pub fn required_tools(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: self.build.program.clone(),
                version: self.build.version.clone(),
                install_hint: self.build.install_hint.clone(),
            },
            ToolSpec {
                name: self.deploy.program.clone(),
                version: self.deploy.version.clone(),
                install_hint: self.deploy.install_hint.clone(),
            },
        ]
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).as_ref())
}

/// Bare names stay as-is for `PATH` lookup; relative paths are anchored to `project_dir`
fn resolve_program(project_dir: &Path, program: &str) -> String {
    let path = Path::new(program);
    if program.contains(std::path::MAIN_SEPARATOR) && path.is_relative() {
        project_dir.join(path).to_string_lossy().into_owned()
    } else {
        program.to_string()
    }
}

fn deserialize_timeout<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| humantime::parse_duration(&value).map_err(serde::de::Error::custom))
        .transpose()
}
