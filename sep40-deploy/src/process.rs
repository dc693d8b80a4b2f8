//! Subprocess execution for the build and deploy stages
//!
//! Each call awaits the child before returning. An optional timeout kills the
//! child once the deadline passes.

use crate::env::Secret;
use crate::error::{ProcessError, SpawnSnafu, TimedOutSnafu, WaitSnafu};
use snafu::{OptionExt, ResultExt};
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

#[derive(Clone)]
enum Arg {
    Plain(OsString),
    Secret(Secret),
}

/// Program plus arguments; secret arguments are masked when displayed
#[derive(Clone)]
pub struct CommandLine {
    program: String,
    args: Vec<Arg>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(Arg::Plain(arg.into()));
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args
            .extend(args.into_iter().map(|arg| Arg::Plain(arg.into())));
        self
    }

    #[must_use]
    pub fn secret_arg(mut self, secret: &Secret) -> Self {
        self.args.push(Arg::Secret(secret.clone()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, dir: &Path) -> Command {
        let mut command = Command::new(&self.program);
        for arg in &self.args {
            match arg {
                Arg::Plain(value) => command.arg(value),
                Arg::Secret(secret) => command.arg(secret.expose()),
            };
        }
        command.current_dir(dir).kill_on_drop(true);
        command
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            match arg {
                Arg::Plain(value) => write!(f, " {}", value.to_string_lossy())?,
                Arg::Secret(secret) => write!(f, " {secret}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandLine({self})")
    }
}

/// Which standard streams of the child are piped back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Streams {
    Inherit,
    Stdout,
    All,
}

/// Exit status and piped output of a finished child
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    /// Empty unless stderr was piped
    pub stderr: String,
}

/// Run with all standard streams inherited so output is visible live
pub async fn run_inherited(
    command: &CommandLine,
    dir: &Path,
    timeout: Option<Duration>,
) -> Result<ExitStatus, ProcessError> {
    run(command, dir, timeout, Streams::Inherit)
        .await
        .map(|captured| captured.status)
}

/// Run with stdout captured; stdin and stderr stay inherited
pub async fn run_captured(
    command: &CommandLine,
    dir: &Path,
    timeout: Option<Duration>,
) -> Result<Captured, ProcessError> {
    run(command, dir, timeout, Streams::Stdout).await
}

/// Run with stdout and stderr captured and no stdin, for tool queries
pub async fn run_quiet(
    command: &CommandLine,
    dir: &Path,
    timeout: Option<Duration>,
) -> Result<Captured, ProcessError> {
    run(command, dir, timeout, Streams::All).await
}

async fn run(
    command: &CommandLine,
    dir: &Path,
    timeout: Option<Duration>,
    streams: Streams,
) -> Result<Captured, ProcessError> {
    let program = command.program();
    let mut process = command.command(dir);
    if streams != Streams::Inherit {
        process.stdout(Stdio::piped());
    }
    if streams == Streams::All {
        process.stderr(Stdio::piped()).stdin(Stdio::null());
    }

    tracing::debug!(%command, dir = %dir.display(), ?timeout, "spawning");
    let child = process.spawn().context(SpawnSnafu { program })?;

    // Dropping the future on timeout drops the child, which kills it
    let wait = child.wait_with_output();
    let waited = match timeout {
        Some(after) => tokio::time::timeout(after, wait)
            .await
            .ok()
            .context(TimedOutSnafu { program, after })?,
        None => wait.await,
    };
    let output = waited.context(WaitSnafu { program })?;

    tracing::debug!(program, status = %output.status, "finished");
    Ok(Captured {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
