// Call list

use serde_json::Value;

use crate::decode::{CallListDecoder, Decoder, JsonDecoder};
use crate::error::Error;
use crate::session::Session;
use crate::transport::{Form, Transport};

const CALL_LIST_PAGE: &str = "/fon_num/foncalls_list.lua";

impl<T: Transport> Session<T> {
    /// The call list as CSV, exactly as the router exports it.
    pub fn download_call_list(&self) -> Result<String, Error> {
        let body = self.get_page(CALL_LIST_PAGE, &Form::new().field("csv", ""))?;
        CallListDecoder.decode(&body)
    }

    /// Clear the call list. Returns the router's JSON answer.
    pub fn delete_call_list(&self) -> Result<Value, Error> {
        let form = Form::new()
            .field("usejournal", 1)
            .field("callstab", "all")
            .field("submit", "clear")
            .field("clear", 1);
        JsonDecoder::<Value>::new().decode(&self.post_form(CALL_LIST_PAGE, &form)?)
    }
}
