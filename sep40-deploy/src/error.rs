//! Error taxonomy for the deploy pipeline
//!
//! Every variant is terminal for a run: it is rendered as a single line on
//! stderr and the process exits with [`EXIT_FAILURE`].

use snafu::Snafu;
use std::path::PathBuf;
use std::time::Duration;

/// Process exit code for every failed run
pub const EXIT_FAILURE: u8 = 1;

/// Coarse classification of a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    Config,
    DependencyMissing,
    Build,
    ArtifactMissing,
    Deploy,
    Timeout,
}

/// Failures while running an external tool, independent of which stage ran it
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProcessError {
    #[snafu(display("failed to start `{program}`: {source}"))]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[snafu(display("failed while waiting for `{program}`: {source}"))]
    Wait {
        program: String,
        source: std::io::Error,
    },

    #[snafu(display(
        "`{program}` did not finish within {}",
        humantime::format_duration(*after)
    ))]
    TimedOut { program: String, after: Duration },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BuildError {
    #[snafu(transparent)]
    Process { source: ProcessError },

    #[snafu(display("build command `{program}` failed with {}", describe_exit(*code)))]
    Exited { program: String, code: Option<i32> },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DeployError {
    #[snafu(transparent)]
    Process { source: ProcessError },

    #[snafu(display("deploy command `{program}` failed with {}", describe_exit(*code)))]
    Failed { program: String, code: Option<i32> },

    #[snafu(display("deploy command `{program}` returned an empty contract identifier"))]
    EmptyIdentifier { program: String },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display(
        "usage: sep40-deploy [OPTIONS] <network> (expected exactly one network argument, got {count})"
    ))]
    Usage { count: usize },

    #[snafu(display("usage: sep40-deploy [OPTIONS] <network> ({detail})"))]
    InvalidArguments { detail: String },

    #[snafu(display("network name must not be empty"))]
    EmptyNetwork,

    #[snafu(display("{var} must be set to a non-empty deployment secret"))]
    MissingSecret { var: String },

    #[snafu(display("failed to read config {}: {source}", path.display()))]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse config {}: {source}", path.display()))]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[snafu(display("failed to resolve project directory {}: {source}", path.display()))]
    ProjectDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to read env file {}: {source}", path.display()))]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[snafu(display("required tool `{tool}` was not found on PATH; {hint}"))]
    DependencyMissing { tool: String, hint: String },

    #[snafu(display("`{tool}` {installed} does not satisfy {required}; {hint}"))]
    DependencyOutdated {
        tool: String,
        installed: String,
        required: String,
        hint: String,
    },

    #[snafu(display("failed to query the version of `{tool}`: {source}"))]
    VersionProbe { tool: String, source: ProcessError },

    #[snafu(transparent)]
    Build { source: BuildError },

    #[snafu(display("build artifact not found at {}", path.display()))]
    ArtifactMissing { path: PathBuf },

    #[snafu(transparent)]
    Deploy { source: DeployError },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Usage { .. } | Error::InvalidArguments { .. } | Error::EmptyNetwork => {
                ErrorKind::Usage
            }
            Error::MissingSecret { .. }
            | Error::ReadConfig { .. }
            | Error::ParseConfig { .. }
            | Error::ProjectDir { .. }
            | Error::EnvFile { .. } => ErrorKind::Config,
            Error::VersionProbe {
                source: ProcessError::TimedOut { .. },
                ..
            }
            | Error::Build {
                source:
                    BuildError::Process {
                        source: ProcessError::TimedOut { .. },
                    },
            }
            | Error::Deploy {
                source:
                    DeployError::Process {
                        source: ProcessError::TimedOut { .. },
                    },
            } => ErrorKind::Timeout,
            Error::DependencyMissing { .. }
            | Error::DependencyOutdated { .. }
            | Error::VersionProbe { .. } => ErrorKind::DependencyMissing,
            Error::Build { .. } => ErrorKind::Build,
            Error::ArtifactMissing { .. } => ErrorKind::ArtifactMissing,
            Error::Deploy { .. } => ErrorKind::Deploy,
        }
    }

    /// Every failure maps to the same exit code
    pub fn exit_code(&self) -> u8 {
        EXIT_FAILURE
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
