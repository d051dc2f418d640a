use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Which login page the firmware speaks.
///
/// FRITZ!OS 5.50 and later serve `login_sid.lua`; older firmware only
/// knows the XML page behind `/cgi-bin/webcm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMethod {
    /// `../html/login_sid.xml` through `webcm`, pre FRITZ!OS 5.50.
    LegacyXml,
    /// `/login_sid.lua` form login.
    #[default]
    LuaForm,
}

impl LoginMethod {
    /// The page that reports session state and hands out challenges.
    pub fn login_page(self) -> &'static str {
        match self {
            Self::LegacyXml => "../html/login_sid.xml",
            Self::LuaForm => "/login_sid.lua",
        }
    }

    /// The form field that carries the challenge response.
    pub fn response_field(self) -> &'static str {
        match self {
            Self::LegacyXml => "login:command/response",
            Self::LuaForm => "response",
        }
    }
}

/// A 16-hex-digit session identifier.
///
/// The all-zero value means "no session" and is never sent to the router.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    const ZERO: &'static str = "0000000000000000";

    /// The unauthenticated session.
    pub fn none() -> Self {
        Self(Self::ZERO.to_owned())
    }

    /// Parse an identifier as the router prints it.
    ///
    /// Returns `None` unless `raw` is exactly 16 hex digits.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        (raw.len() == 16 && raw.bytes().all(|b| b.is_ascii_hexdigit()))
            .then(|| Self(raw.to_ascii_lowercase()))
    }

    pub fn is_none(&self) -> bool {
        self.0 == Self::ZERO
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::none()
    }
}

// The SID is a bearer token; keep it out of debug dumps.
impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("SessionId(none)")
        } else {
            f.write_str("SessionId(****)")
        }
    }
}

/// Credentials for the local web UI and for remote (dyndns) access.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Web UI user, only needed when the box is set up for user logins.
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub remote_user: Option<String>,
    pub remote_password: Option<SecretString>,
    pub remote_enabled: bool,
}

impl Credentials {
    /// Local-network credentials.
    pub fn local(username: Option<String>, password: Option<SecretString>) -> Self {
        Self {
            username,
            password,
            ..Self::default()
        }
    }

    /// Remote-access credentials.
    pub fn remote(user: impl Into<String>, password: SecretString) -> Self {
        Self {
            remote_user: Some(user.into()),
            remote_password: Some(password),
            remote_enabled: true,
            ..Self::default()
        }
    }

    /// Check the mode invariants. Remote mode needs both remote fields.
    pub fn validate(&self) -> Result<(), Error> {
        if self.remote_enabled && (self.remote_user.is_none() || self.remote_password.is_none())
        {
            return Err(Error::Config {
                message: "remote config mode enabled, but no username or no password provided"
                    .into(),
            });
        }
        Ok(())
    }

    /// The user name to submit with a lua form login, if any.
    pub(crate) fn login_username(&self, method: LoginMethod) -> Option<&str> {
        match method {
            LoginMethod::LegacyXml => None,
            LoginMethod::LuaForm if self.remote_enabled => self.remote_user.as_deref(),
            LoginMethod::LuaForm => self.username.as_deref(),
        }
    }

    /// The secret hashed into the challenge response. Missing means empty.
    pub(crate) fn login_secret(&self, method: LoginMethod) -> &str {
        let secret = match method {
            LoginMethod::LuaForm if self.remote_enabled => self.remote_password.as_ref(),
            _ => self.password.as_ref(),
        };
        secret.map_or("", |s| s.expose_secret())
    }

    /// HTTP basic credentials, sent on every request in remote mode with
    /// the legacy login method.
    pub(crate) fn basic_auth(&self, method: LoginMethod) -> Option<(&str, &str)> {
        if !self.remote_enabled || method != LoginMethod::LegacyXml {
            return None;
        }
        let user = self.remote_user.as_deref()?;
        let password = self.remote_password.as_ref()?.expose_secret();
        Some((user, password))
    }
}

/// Compute the answer to a login challenge.
///
/// `challenge + "-" + md5(utf16le(challenge + "-" + secret))` in lowercase hex,
/// as described in AVM's session ID technical note.
pub fn challenge_response(challenge: &str, secret: &str) -> String {
    let plain = format!("{challenge}-{secret}");
    let utf16le: Vec<u8> = plain.encode_utf16().flat_map(u16::to_le_bytes).collect();
    let digest = md5::compute(&utf16le);
    format!("{challenge}-{digest:x}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn challenge_response_matches_vendor_example() {
        // Example from the AVM session ID technical note.
        assert_eq!(
            challenge_response("1234567z", "äbc"),
            "1234567z-9e224a41eeefa284df7bb0f26c2913e2"
        );
    }

    #[test]
    fn challenge_response_hashes_utf16le() {
        let plain = "abcdef01-secret";
        let bytes: Vec<u8> = plain.bytes().flat_map(|b| [b, 0]).collect();
        let expected = format!("abcdef01-{:x}", md5::compute(&bytes));
        assert_eq!(challenge_response("abcdef01", "secret"), expected);
    }

    #[test]
    fn challenge_response_with_empty_secret() {
        let response = challenge_response("deadbeef", "");
        assert!(response.starts_with("deadbeef-"));
        assert_eq!(response.len(), "deadbeef-".len() + 32);
    }

    #[test]
    fn session_id_parse() {
        assert!(SessionId::parse("0123456789ABCDEF").is_some());
        assert_eq!(
            SessionId::parse("0123456789ABCDEF").unwrap().as_str(),
            "0123456789abcdef"
        );
        assert!(SessionId::parse("0000000000000000").unwrap().is_none());
        assert!(SessionId::parse("xyz").is_none());
        assert!(SessionId::parse("0123456789abcdeg").is_none());
    }

    #[test]
    fn session_id_debug_hides_token() {
        let sid = SessionId::parse("0123456789abcdef").unwrap();
        assert_eq!(format!("{sid:?}"), "SessionId(****)");
    }

    #[test]
    fn remote_without_password_is_config_error() {
        let creds = Credentials {
            remote_user: Some("admin".into()),
            remote_enabled: true,
            ..Credentials::default()
        };
        assert!(matches!(creds.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn remote_lua_uses_remote_secret() {
        let creds = Credentials::remote("remote", "r-pass".to_owned().into());
        assert_eq!(creds.login_secret(LoginMethod::LuaForm), "r-pass");
        assert_eq!(creds.login_username(LoginMethod::LuaForm), Some("remote"));
        assert!(creds.basic_auth(LoginMethod::LuaForm).is_none());
        assert_eq!(
            creds.basic_auth(LoginMethod::LegacyXml),
            Some(("remote", "r-pass"))
        );
    }

    #[test]
    fn local_without_password_hashes_empty_secret() {
        let creds = Credentials::local(None, None);
        assert_eq!(creds.login_secret(LoginMethod::LuaForm), "");
        assert!(creds.login_username(LoginMethod::LuaForm).is_none());
        assert!(creds.validate().is_ok());
    }
}
