use clap::{Args, Parser};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{DEFAULT_CONFIG_FILE, DEFAULT_ENV_FILE, expand_path};

/// Build the SEP-40 oracle contract and deploy it to a Stellar network
#[derive(Debug, Parser)]
#[clap(name = "sep40-deploy", version, about)]
pub struct Cli {
    /// Show debug logs on stderr (RUST_LOG overrides)
    #[clap(short, long, global = true)]
    pub verbose: bool,

    #[clap(flatten)]
    pub deploy: DeployArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DeployArgs {
    /// Target network name, passed through to the deploy CLI unchanged.
    /// Put `--` before a name that starts with `-`.
    #[clap(value_name = "NETWORK")]
    pub networks: Vec<String>,

    /// Configuration file (default: deploy.toml, optional)
    #[clap(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Dotenv file holding the deployment secret (default: .env, optional)
    #[clap(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Directory the build and deploy commands run in
    #[clap(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Limit for each subprocess, e.g. "90s" or "15m"
    #[clap(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Write a TOML deployment report after a successful deploy
    #[clap(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

impl DeployArgs {
    /// Config path and whether it was given explicitly
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (expand_path(path), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        }
    }

    /// Env file path and whether it was given explicitly
    pub fn env_file_path(&self) -> (PathBuf, bool) {
        match &self.env_file {
            Some(path) => (expand_path(path), true),
            None => (PathBuf::from(DEFAULT_ENV_FILE), false),
        }
    }
}
