//! CLI configuration: thin wrapper around `fritzbox_config`.
//!
//! Loads the file + environment layers and applies `GlobalOpts` flag
//! overrides on top (--host, --remote, --timeout, ...).

use fritzbox_config::{Config, LogSink, LoginMode};

use crate::cli::{GlobalOpts, LoginMethodArg};
use crate::error::CliError;

pub use fritzbox_config::config_path;

/// The config file in effect: `--config`/`FRITZBOX_CONFIG` or the
/// platform default.
pub fn active_path(global: &GlobalOpts) -> std::path::PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the config and apply CLI flag overrides.
///
/// Flags > environment > file > defaults.
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut config = fritzbox_config::load_config_from(&active_path(global))?;
    apply_overrides(&mut config, global);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, global: &GlobalOpts) {
    if let Some(ref host) = global.host {
        config.host.clone_from(host);
    }
    if global.remote {
        config.remote = Some(true);
    } else if global.local {
        config.remote = Some(false);
    }
    if let Some(ref username) = global.username {
        config.username = Some(username.clone());
    }
    if let Some(method) = global.login_method {
        config.login_method = match method {
            LoginMethodArg::Lua => LoginMode::Lua,
            LoginMethodArg::Legacy => LoginMode::Legacy,
        };
    }
    if let Some(ref logging) = global.logging {
        config.logging = LogSink::from(logging.clone());
    }
    if global.log_requests {
        config.log_requests = true;
    }
    if let Some(timeout) = global.timeout {
        config.timeout = timeout;
    }
}
