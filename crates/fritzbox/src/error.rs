//! CLI error types with miette diagnostics.
//!
//! Maps `fritzbox_api::Error` and `ConfigError` into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use fritzbox_api::Error as ApiError;
use fritzbox_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the router")]
    #[diagnostic(
        code(fritzbox::connection_failed),
        help(
            "Check that the box is reachable and the host is right.\n\
             Try: fritzbox --host 192.168.178.1 tam status"
        )
    )]
    ConnectionFailed {
        #[source]
        source: ApiError,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(fritzbox::tls_error),
        help(
            "Remote mode pins the router certificate.\n\
             Save it as <cert_dir>/<host>.pem (see `fritzbox config show`)."
        )
    )]
    TlsError { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Login failed: {message}")]
    #[diagnostic(
        code(fritzbox::auth_failed),
        help(
            "Verify the password and, if the box uses user logins, the user name.\n\
             Run: fritzbox config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("Remote access to '{host}' needs a remote user and password")]
    #[diagnostic(
        code(fritzbox::no_remote_credentials),
        help(
            "Set remote_user in the config file and store the password with:\n\
             fritzbox config set-password --remote\n\
             Or use --local for the box on this network."
        )
    )]
    NoRemoteCredentials { host: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(fritzbox::not_found),
        help("Run: fritzbox {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Router ───────────────────────────────────────────────────────

    #[error("Router error: {message}")]
    #[diagnostic(code(fritzbox::router_error))]
    Router { message: String },

    #[error("{operation} was sent but not confirmed: {detail}")]
    #[diagnostic(
        code(fritzbox::unconfirmed),
        help("Check the current state, e.g. with `fritzbox ports list`.")
    )]
    Unconfirmed { operation: String, detail: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(
        code(fritzbox::decode),
        help("The firmware may have changed its pages. Re-run with -vv for details.")
    )]
    Decode { message: String },

    // ── Validation / configuration ───────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fritzbox::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(fritzbox::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not read password: {0}")]
    #[diagnostic(code(fritzbox::prompt))]
    Prompt(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoRemoteCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Library errors → CliError ────────────────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Config { message } => Self::Validation {
                field: "credentials".into(),
                reason: message,
            },
            ApiError::Protocol { message } | ApiError::Authentication { message } => {
                Self::AuthFailed { message }
            }
            ApiError::Tls(message) => Self::TlsError { message },
            ApiError::InvalidUrl(e) => Self::Validation {
                field: "host".into(),
                reason: e.to_string(),
            },
            ApiError::Decode { message, .. } => Self::Decode { message },
            ApiError::Application { message } => Self::Router { message },
            err @ ApiError::Transport(_) if err.is_connection() => {
                Self::ConnectionFailed { source: err }
            }
            // Reached the router, but it answered with an HTTP error.
            err @ ApiError::Transport(_) => Self::Router {
                message: err.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoRemoteCredentials { host } => Self::NoRemoteCredentials { host },
            other => Self::Config(Box::new(other)),
        }
    }
}
