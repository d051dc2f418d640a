mod cli;
mod commands;
mod config;
mod error;
mod output;
mod report;

use clap::{CommandFactory, Parser};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use fritzbox_api::Session;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::report::Reporter;

fn main() {
    let cli = Cli::parse();
    setup_diagnostics(cli.global.verbose);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Diagnostics go to stderr; stdout carries command output only.
/// `RUST_LOG` wins over `-v`.
fn setup_diagnostics(verbose: u8) {
    let level = [LevelFilter::WARN, LevelFilter::INFO, LevelFilter::DEBUG]
        .get(usize::from(verbose))
        .copied()
        .unwrap_or(LevelFilter::TRACE);
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let global = cli.global;
    match cli.command {
        Command::Config(args) => commands::config_cmd::handle(args, &global),

        Command::Completions(args) => {
            clap_complete::generate(
                args.shell,
                &mut Cli::command(),
                "fritzbox",
                &mut std::io::stdout(),
            );
            Ok(())
        }

        cmd => {
            let config = config::resolve(&global)?;
            let mut reporter = Reporter::open(&config.logging, config.newline);

            let result = open_session(&config).and_then(|session| {
                tracing::debug!(command = ?cmd, host = %config.host, "logged in");
                commands::dispatch(cmd, &session, &config, &global, &mut reporter)
            });
            if let Err(ref err) = result {
                reporter.failure(&err.to_string());
            }
            result
        }
    }
}

fn open_session(config: &fritzbox_config::Config) -> Result<Session, CliError> {
    Ok(Session::open(config.to_session_config()?)?)
}
