// Answering machines (TAM)

use tracing::{debug, info};

use crate::decode::{Decoder, TamAckDecoder, TamStatusDecoder, TamToggle};
use crate::error::Error;
use crate::session::{DATA_PAGE, Session};
use crate::transport::{Form, Transport};

const TAM_LIST_PAGE: &str = "/fon_devices/tam_list.lua";

impl<T: Transport> Session<T> {
    /// On/off state of each answering machine, in machine order.
    pub fn tam_status(&self) -> Result<Vec<bool>, Error> {
        let form = Form::new()
            .field("page", "tam")
            .field("lang", "de")
            .field("xhr", 1);
        let body = self.post_form(DATA_PAGE, &form)?;
        TamStatusDecoder.decode(&body)
    }

    /// Bring machine `index` into the requested state.
    ///
    /// The router only offers a toggle, so the current state is read
    /// first and at most one toggle request is sent.
    pub fn set_tam(&self, index: usize, enabled: bool) -> Result<TamToggle, Error> {
        let states = self.tam_status()?;
        let Some(&current) = states.get(index) else {
            info!(index, available = states.len(), "no such answering machine");
            return Ok(TamToggle::NoSuchMachine {
                index,
                available: states.len(),
            });
        };
        if current == enabled {
            debug!(index, enabled, "answering machine already in requested state");
            return Ok(TamToggle::Unchanged { enabled });
        }

        let params = Form::new()
            .field("useajax", 1)
            .field("TamNr", index)
            .field("switch", "toggle");
        let body = self.get_page(TAM_LIST_PAGE, &params)?;

        let outcome = match TamAckDecoder.decode(&body) {
            Ok(Some(acknowledged)) if acknowledged == enabled => TamToggle::Switched { enabled },
            Ok(Some(acknowledged)) => TamToggle::Mismatch {
                requested: enabled,
                acknowledged,
            },
            Ok(None) => TamToggle::Unacknowledged { requested: enabled },
            Err(Error::Decode { message, .. }) => {
                debug!(%message, "toggle answer not understood");
                TamToggle::Unacknowledged { requested: enabled }
            }
            Err(e) => return Err(e),
        };
        Ok(outcome)
    }
}
