//! Call list command handlers.

use fritzbox_api::Session;
use fritzbox_config::Config;

use crate::cli::{CallsArgs, CallsCommand};
use crate::error::CliError;
use crate::report::Reporter;

pub fn handle(
    session: &Session,
    args: CallsArgs,
    config: &Config,
    reporter: &mut Reporter,
) -> Result<(), CliError> {
    match args.command {
        CallsCommand::Download { path } => {
            let path = path.unwrap_or_else(|| config.call_list_path.clone());
            let csv = session.download_call_list()?;
            std::fs::write(&path, csv)?;
            reporter.message(&format!("Call list saved to {}", path.display()));
            Ok(())
        }

        CallsCommand::Delete => {
            let answer = session.delete_call_list()?;
            tracing::debug!(%answer, "call list cleared");
            reporter.message("Call list deleted");
            Ok(())
        }
    }
}
