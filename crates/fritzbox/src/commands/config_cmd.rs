//! Config subcommand handlers.

use fritzbox_config::SecretKind;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::resolve(global)?.redacted();
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => cfg.to_toml()?,
                format => output::render_single(format, &cfg, |_| String::new(), |_| String::new()),
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::active_path(global).display().to_string(), false);
            Ok(())
        }

        ConfigCommand::SetPassword { remote } => {
            let cfg = config::resolve(global)?;
            let (kind, prompt) = if remote {
                (SecretKind::RemotePassword, "Remote access password: ")
            } else {
                (SecretKind::Password, "Password: ")
            };

            let secret =
                rpassword::prompt_password(prompt).map_err(|e| CliError::Prompt(e.to_string()))?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "must not be empty".into(),
                });
            }

            fritzbox_config::store_secret(&cfg.host, kind, &secret)?;
            eprintln!(
                "Stored {} for {} in the system keyring",
                kind.keyring_account(&cfg.host),
                cfg.host
            );
            Ok(())
        }
    }
}
