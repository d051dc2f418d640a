// Session login and logout
//
// Challenge-response login as described in AVM's session ID note:
// read the login page, answer its challenge, read the SID back.

use tracing::{debug, warn};

use crate::auth::{LoginMethod, SessionId, challenge_response};
use crate::decode::{Decoder, SessionInfoDecoder};
use crate::error::Error;
use crate::session::Session;
use crate::transport::{Form, Transport};

const HOME_PAGE: &str = "/home/home.lua";
const LEGACY_MENU_PAGE: &str = "../html/de/menus/menu2.html";

impl<T: Transport> Session<T> {
    /// Authenticate with the router.
    ///
    /// When the login page already reports a valid SID (no password set,
    /// or the current session is still alive) it is adopted and no
    /// credentials are sent.
    pub fn login(&mut self) -> Result<(), Error> {
        let page = self.login_method.login_page();
        debug!("reading session state from {page}");

        let status = self.transport.get(&self.sid, page, &Form::new())?;
        let info = SessionInfoDecoder.decode(&status)?;

        if !info.sid.is_none() {
            debug!("session already valid");
            self.sid = info.sid;
            return Ok(());
        }
        self.sid = SessionId::none();

        if let Some(seconds) = info.block_time.filter(|s| *s > 0) {
            warn!(seconds, "router reports a login block time");
        }

        let method = self.login_method;
        let response = challenge_response(&info.challenge, self.credentials.login_secret(method));
        let mut form = Form::new();
        if let Some(user) = self.credentials.login_username(method) {
            form.push("username", user);
        }
        form.push(method.response_field(), response);

        debug!("answering login challenge");
        let output = self.transport.post(&self.sid, page, &form)?;
        let info = SessionInfoDecoder.decode(&output)?;

        if info.sid.is_none() {
            return Err(Error::Authentication {
                message: "login failed with an unknown response".into(),
            });
        }

        debug!("login successful");
        self.sid = info.sid;
        Ok(())
    }

    /// End the session. Best effort: failures are logged, never returned,
    /// and the session id is reset either way.
    pub fn logout(&mut self) {
        if self.sid.is_none() {
            return;
        }

        let result = match self.login_method {
            LoginMethod::LuaForm => {
                let params = Form::new().field("logout", 1);
                self.transport.get(&self.sid, HOME_PAGE, &params)
            }
            LoginMethod::LegacyXml => {
                let form = Form::new().field("security:command/logout", "logout");
                self.transport.post(&self.sid, LEGACY_MENU_PAGE, &form)
            }
        };

        match result {
            Ok(_) => debug!("logout complete"),
            Err(e) => debug!(error = %e, "logout failed"),
        }
        self.sid = SessionId::none();
    }
}
