//! Command dispatch: bridges CLI args -> session operations -> output.

pub mod calls;
pub mod config_cmd;
pub mod ports;
pub mod stats;
pub mod tam;

use fritzbox_api::Session;
use fritzbox_config::Config;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output;
use crate::report::Reporter;

/// Dispatch a router-bound command to the appropriate handler.
pub fn dispatch(
    cmd: Command,
    session: &Session,
    config: &Config,
    global: &GlobalOpts,
    reporter: &mut Reporter,
) -> Result<(), CliError> {
    match cmd {
        Command::Ports(args) => ports::handle(session, args, global, reporter),
        Command::Tam(args) => tam::handle(session, args, global, reporter),
        Command::Stats(args) => stats::handle(session, args, global, reporter),
        Command::Log => stats::logbook(session, global),
        Command::Overview => {
            let data = session.overview()?;
            output::print_output(&output::render_value(global.output, &data), global.quiet);
            Ok(())
        }
        Command::Calls(args) => calls::handle(session, args, config, reporter),
        // Config and Completions are handled before a session is opened
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "does not talk to the router".into(),
        }),
    }
}
