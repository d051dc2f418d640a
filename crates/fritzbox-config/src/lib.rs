//! Configuration for the fritzbox tools.
//!
//! One TOML file, `FRITZBOX_*` environment overrides, credential
//! resolution (env + keyring + plaintext), and translation to
//! `fritzbox_api::SessionConfig`. The CLI layers its flag overrides on top.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fritzbox_api::{Credentials, LoginMethod, SessionConfig, TransportConfig};

/// Host name that means "the box on this LAN". Anything else is remote
/// unless `remote` says otherwise.
pub const LOCAL_HOST: &str = "fritz.box";

const KEYRING_SERVICE: &str = "fritzbox";
const ENV_PREFIX: &str = "FRITZBOX_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("remote access to '{host}' needs remote_user and remote_password")]
    NoRemoteCredentials { host: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Setting types ───────────────────────────────────────────────────

/// Which login page the box speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMode {
    /// `/login_sid.lua` (FRITZ!OS 5.50 and later)
    #[default]
    Lua,
    /// `../html/login_sid.xml` via webcm
    Legacy,
}

impl From<LoginMode> for LoginMethod {
    fn from(mode: LoginMode) -> Self {
        match mode {
            LoginMode::Lua => Self::LuaForm,
            LoginMode::Legacy => Self::LegacyXml,
        }
    }
}

/// Where result messages go: `console`, `silent`, or a file path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum LogSink {
    #[default]
    Console,
    Silent,
    File(PathBuf),
}

impl From<String> for LogSink {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "" | "console" => Self::Console,
            "silent" => Self::Silent,
            path => Self::File(PathBuf::from(path)),
        }
    }
}

impl From<LogSink> for String {
    fn from(sink: LogSink) -> Self {
        sink.to_string()
    }
}

impl fmt::Display for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console => f.write_str("console"),
            Self::Silent => f.write_str("silent"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Line terminator for the file sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Newline {
    #[default]
    Native,
    Lf,
    Crlf,
}

impl Newline {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native if cfg!(windows) => "\r\n",
            Self::Native | Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// The whole configuration file. Every field has a default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Host name or IP of the box, optionally with `:port`.
    pub host: String,

    /// Force remote (https) mode on or off. Unset: remote unless the
    /// host is `fritz.box`.
    pub remote: Option<bool>,

    /// Web UI user, for boxes set up with user logins.
    pub username: Option<String>,

    /// Web UI password (plaintext, prefer the keyring).
    pub password: Option<String>,

    pub remote_user: Option<String>,

    /// Remote access password (plaintext, prefer the keyring).
    pub remote_password: Option<String>,

    pub login_method: LoginMode,

    pub logging: LogSink,

    pub newline: Newline,

    /// Log every GET URL before it is sent.
    pub log_requests: bool,

    /// Where `calls download` writes the CSV.
    pub call_list_path: PathBuf,

    /// Directory holding `<host>.pem` for remote mode.
    pub cert_dir: PathBuf,

    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: LOCAL_HOST.into(),
            remote: None,
            username: None,
            password: None,
            remote_user: None,
            remote_password: None,
            login_method: LoginMode::default(),
            logging: LogSink::default(),
            newline: Newline::default(),
            log_requests: false,
            call_list_path: PathBuf::from("calllist.csv"),
            cert_dir: PathBuf::from("/etc/ssl/certs"),
            timeout: 30,
        }
    }
}

impl Config {
    pub fn remote_enabled(&self) -> bool {
        self.remote.unwrap_or(self.host != LOCAL_HOST)
    }

    /// A copy safe to print: plaintext passwords are masked.
    pub fn redacted(&self) -> Self {
        let mask = |secret: &Option<String>| secret.as_ref().map(|_| "********".to_owned());
        Self {
            password: mask(&self.password),
            remote_password: mask(&self.remote_password),
            ..self.clone()
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "host".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least one second".into(),
            });
        }
        Ok(())
    }

    /// Resolve a password through the chain: environment, then keyring,
    /// then the plaintext value in the file.
    pub fn resolve_secret(&self, kind: SecretKind) -> Option<SecretString> {
        resolve_with(self, kind, keyring_lookup)
    }

    /// Credentials with every password resolved.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.resolve_secret(SecretKind::Password),
            remote_user: self.remote_user.clone(),
            remote_password: self.resolve_secret(SecretKind::RemotePassword),
            remote_enabled: self.remote_enabled(),
        }
    }

    /// Build a `SessionConfig`. Remote mode without remote credentials
    /// fails here, before anything touches the network.
    pub fn to_session_config(&self) -> Result<SessionConfig, ConfigError> {
        self.validate()?;
        let credentials = self.credentials();
        if credentials.validate().is_err() {
            return Err(ConfigError::NoRemoteCredentials {
                host: self.host.clone(),
            });
        }

        Ok(SessionConfig {
            host: self.host.clone(),
            login_method: self.login_method.into(),
            credentials,
            transport: TransportConfig {
                timeout: Duration::from_secs(self.timeout),
                cert_dir: self.cert_dir.clone(),
                log_requests: self.log_requests,
            },
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("de", "fritzbox-tools", "fritzbox").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fritzbox");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from `path` + environment. A missing file is not an
/// error; defaults apply.
///
/// Passwords are not taken from the environment here: they go through
/// [`Config::resolve_secret`] so the keyring sits between env and file.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["password", "remote_password"]));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// The two secrets the tools know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Password,
    RemotePassword,
}

impl SecretKind {
    pub fn env_var(self) -> &'static str {
        match self {
            Self::Password => "FRITZBOX_PASSWORD",
            Self::RemotePassword => "FRITZBOX_REMOTE_PASSWORD",
        }
    }

    /// Keyring account name, scoped by host.
    pub fn keyring_account(self, host: &str) -> String {
        match self {
            Self::Password => format!("{host}/password"),
            Self::RemotePassword => format!("{host}/remote-password"),
        }
    }
}

fn keyring_lookup(account: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, account)
        .ok()?
        .get_password()
        .ok()
}

fn resolve_with(
    config: &Config,
    kind: SecretKind,
    keyring: impl FnOnce(&str) -> Option<String>,
) -> Option<SecretString> {
    // 1. Env var
    if let Ok(secret) = std::env::var(kind.env_var()) {
        return Some(SecretString::from(secret));
    }

    // 2. Keyring
    if let Some(secret) = keyring(&kind.keyring_account(&config.host)) {
        return Some(SecretString::from(secret));
    }

    // 3. Plaintext in config
    let plaintext = match kind {
        SecretKind::Password => &config.password,
        SecretKind::RemotePassword => &config.remote_password,
    };
    plaintext.clone().map(SecretString::from)
}

/// Store a secret in the system keyring for `host`.
pub fn store_secret(host: &str, kind: SecretKind, secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &kind.keyring_account(host))
        .and_then(|entry| entry.set_password(secret))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}
