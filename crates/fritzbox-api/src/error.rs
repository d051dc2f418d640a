use thiserror::Error;

/// Top-level error type for the `fritzbox-api` crate.
///
/// Covers every failure mode of a session: configuration checks, the
/// login handshake, transport, response decoding, and error fragments
/// the router embeds in its HTML. The CLI maps these into user-facing
/// diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Credentials missing or inconsistent for the selected mode.
    /// Raised before any request leaves the process.
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Authentication ──────────────────────────────────────────────
    /// The login page answered with something that is not the expected
    /// `SessionInfo` XML document.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// The handshake completed but the router did not hand out a session.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, HTTP status, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or pinned certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// The response did not have the expected shape, with the raw body
    /// for debugging.
    #[error("Decode error: {message}")]
    Decode { message: String, body: String },

    /// The router reported a user-facing error (`<p class="ErrorMsg">`).
    #[error("Router error: {message}")]
    Application { message: String },
}

impl Error {
    pub(crate) fn decode(message: impl Into<String>, body: &str) -> Self {
        Self::Decode {
            message: message.into(),
            body: body.to_owned(),
        }
    }

    /// Returns `true` if the router could not be reached at all.
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            Self::Tls(_) => true,
            _ => false,
        }
    }
}
