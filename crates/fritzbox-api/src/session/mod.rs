// Router session
//
// `Session` owns the session id and the transport. Opening one logs in;
// dropping it logs out. The domain operations (port sharing, answering
// machines, statistics, call list) are inherent methods implemented in
// the sibling files.

mod calls;
mod login;
mod ports;
mod stats;
mod tam;

use tracing::debug;

use crate::auth::{Credentials, LoginMethod, SessionId};
use crate::error::Error;
use crate::transport::{Endpoint, FilePart, Form, HttpTransport, Transport, TransportConfig};

pub use ports::NewPortRule;

/// The JSON surface of the web UI, distinguished by its `page` field.
pub(crate) const DATA_PAGE: &str = "/data.lua";
/// Upload target for settings and firmware files.
pub(crate) const FIRMWARECFG_PAGE: &str = "/cgi-bin/firmwarecfg";

/// Everything needed to open a session.
///
/// Built by the CLI (or any other caller) and passed in; the library
/// never reads configuration files.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Host name or IP, optionally with `:port`.
    pub host: String,
    pub login_method: LoginMethod,
    /// `credentials.remote_enabled` selects https and remote-mode TLS.
    pub credentials: Credentials,
    pub transport: TransportConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "fritz.box".into(),
            login_method: LoginMethod::default(),
            credentials: Credentials::default(),
            transport: TransportConfig::default(),
        }
    }
}

/// An authenticated session with the router.
///
/// The session is released when the handle is dropped, on every exit
/// path, so callers never need an explicit logout.
pub struct Session<T: Transport = HttpTransport> {
    transport: T,
    login_method: LoginMethod,
    credentials: Credentials,
    sid: SessionId,
}

impl Session<HttpTransport> {
    /// Validate the credentials, build the HTTP transport and log in.
    ///
    /// Credential problems fail with [`Error::Config`] before any request
    /// is sent.
    pub fn open(config: SessionConfig) -> Result<Self, Error> {
        config.credentials.validate()?;
        let endpoint = Endpoint::new(
            &config.host,
            config.credentials.remote_enabled,
            config.login_method,
        )?;
        let transport = HttpTransport::new(endpoint, &config.credentials, &config.transport)?;
        Self::connect(transport, config.login_method, config.credentials)
    }
}

impl<T: Transport> Session<T> {
    /// Log in over an existing transport.
    pub fn connect(
        transport: T,
        login_method: LoginMethod,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        credentials.validate()?;
        let mut session = Self {
            transport,
            login_method,
            credentials,
            sid: SessionId::none(),
        };
        session.login()?;
        Ok(session)
    }

    /// The current session id (all zeros when logged out).
    pub fn sid(&self) -> &SessionId {
        &self.sid
    }

    pub fn is_authenticated(&self) -> bool {
        !self.sid.is_none()
    }

    pub fn login_method(&self) -> LoginMethod {
        self.login_method
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ── Raw access ───────────────────────────────────────────────────

    /// GET any page with the session attached.
    pub fn get_page(&self, path: &str, params: &Form) -> Result<String, Error> {
        self.transport.get(&self.sid, path, params)
    }

    /// POST any form with the session attached.
    pub fn post_form(&self, path: &str, form: &Form) -> Result<String, Error> {
        self.transport.post(&self.sid, path, form)
    }

    /// Upload files to `/cgi-bin/firmwarecfg` (settings import, firmware).
    pub fn post_file(&self, fields: &Form, files: &[FilePart]) -> Result<String, Error> {
        debug!(files = files.len(), "uploading to firmwarecfg");
        self.transport
            .post_multipart(&self.sid, FIRMWARECFG_PAGE, fields, files)
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.logout();
    }
}
