use clap::Parser;
use clap::error::ErrorKind as ClapErrorKind;
use env_logger::Env;
use sep40_deploy::cli::Cli;
use sep40_deploy::commands::handle_deploy_command;
use sep40_deploy::error::Error;
use sep40_deploy::report::report_failure;
use std::io;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return exit_on_parse_error(&e),
    };

    init_logging(cli.verbose);
    handle_deploy_command(cli.deploy).await
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Help and version exit 0; anything else is a usage error with exit code 1
fn exit_on_parse_error(e: &clap::Error) -> ExitCode {
    init_logging(false);

    if matches!(
        e.kind(),
        ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion
    ) {
        if let Err(err) = e.print() {
            tracing::warn!("failed to print help: {err}");
        }
        return ExitCode::SUCCESS;
    }

    let rendered = e.render().to_string();
    let detail = rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string();
    let error = Error::InvalidArguments { detail };
    if let Err(err) = report_failure(&mut io::stderr().lock(), &error) {
        tracing::warn!("failed to print error: {err}");
    }
    ExitCode::from(error.exit_code())
}
