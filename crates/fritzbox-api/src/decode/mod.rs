// Response decoders
//
// Every page the session reads goes through a `Decoder`: JSON from
// `data.lua`, the `SessionInfo` XML of the login page, and regex
// scrapers for pages that never got a JSON variant. Call sites only see
// the typed output, so a firmware change means swapping one decoder.

pub mod models;
pub mod scrape;
pub mod xml;

use std::marker::PhantomData;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::Error;

pub use models::*;
pub use scrape::{
    CallListDecoder, OnlineCounterDecoder, TamStatusDecoder, TrafficVolumeDecoder,
};
pub use xml::{SessionInfo, SessionInfoDecoder};

/// Turns a raw response body into a typed value. No I/O.
pub trait Decoder {
    type Output;

    fn decode(&self, body: &str) -> Result<Self::Output, Error>;
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        Error::decode(
            format!("{e} (body preview: {:?})", preview(body)),
            body,
        )
    })
}

/// Plain JSON body into any deserializable type.
pub struct JsonDecoder<T>(PhantomData<fn() -> T>);

impl<T> JsonDecoder<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> Decoder for JsonDecoder<T> {
    type Output = T;

    fn decode(&self, body: &str) -> Result<T, Error> {
        from_json(body)
    }
}

/// The `{ "data": ... }` envelope every `data.lua` page answers with.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// `data.lua` body, unwrapped to its `data` member.
pub struct DataDecoder<T>(PhantomData<fn() -> T>);

impl<T> DataDecoder<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for DataDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> Decoder for DataDecoder<T> {
    type Output = T;

    fn decode(&self, body: &str) -> Result<T, Error> {
        from_json::<DataEnvelope<T>>(body).map(|env| env.data)
    }
}

/// `.data.devices[*].rules[*]` of the port overview.
pub struct PortOverviewDecoder;

impl Decoder for PortOverviewDecoder {
    type Output = PortOverview;

    fn decode(&self, body: &str) -> Result<PortOverview, Error> {
        DataDecoder::<PortOverview>::new().decode(body)
    }
}

/// `.data.apply_rule` of the new-rule draft answer.
pub struct ApplyRuleDecoder;

impl Decoder for ApplyRuleDecoder {
    type Output = String;

    fn decode(&self, body: &str) -> Result<String, Error> {
        #[derive(Deserialize)]
        struct Ack {
            #[serde(default)]
            apply_rule: Option<String>,
        }

        let ack = DataDecoder::<Ack>::new().decode(body)?;
        ack.apply_rule
            .ok_or_else(|| Error::decode("missing data.apply_rule", body))
    }
}

/// `.switch_on` of the answering machine toggle answer.
///
/// `None` when the answer carries no state.
pub struct TamAckDecoder;

impl Decoder for TamAckDecoder {
    type Output = Option<bool>;

    fn decode(&self, body: &str) -> Result<Option<bool>, Error> {
        let value: serde_json::Value = from_json(body)?;
        let Some(switch_on) = value.get("switch_on") else {
            return Ok(None);
        };
        let state = match switch_on {
            serde_json::Value::Bool(b) => Some(*b),
            serde_json::Value::Number(n) => n.as_i64().map(|n| n != 0),
            serde_json::Value::String(s) => match s.trim() {
                "1" | "true" | "on" => Some(true),
                "0" | "false" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        };
        state
            .map(Some)
            .ok_or_else(|| Error::decode(format!("unexpected switch_on value {switch_on}"), body))
    }
}

/// `.data.log` of the logbook page.
///
/// Older firmware sends positional rows
/// `[date, time, message, code, category, help link]`, newer firmware
/// sends objects; both are accepted.
pub struct LogbookDecoder;

impl Decoder for LogbookDecoder {
    type Output = Vec<LogEntry>;

    fn decode(&self, body: &str) -> Result<Vec<LogEntry>, Error> {
        #[derive(Deserialize)]
        struct Log {
            log: Vec<RawLogEntry>,
        }

        let log = DataDecoder::<Log>::new().decode(body)?;
        log.log
            .into_iter()
            .map(|raw| raw.into_entry().ok_or_else(|| Error::decode("short logbook row", body)))
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLogEntry {
    Row(Vec<serde_json::Value>),
    Object {
        date: String,
        time: String,
        msg: String,
        #[serde(default)]
        id: Option<serde_json::Value>,
        #[serde(default)]
        group: Option<String>,
        #[serde(default)]
        helplink: Option<String>,
    },
}

impl RawLogEntry {
    fn into_entry(self) -> Option<LogEntry> {
        match self {
            Self::Row(row) => {
                let text = |i: usize| row.get(i).map(value_text);
                Some(LogEntry {
                    date: text(0)?,
                    time: text(1)?,
                    message: text(2)?,
                    code: text(3),
                    category: text(4),
                    help_link: text(5).filter(|s| !s.is_empty()),
                })
            }
            Self::Object {
                date,
                time,
                msg,
                id,
                group,
                helplink,
            } => Some(LogEntry {
                date,
                time,
                message: msg,
                code: id.as_ref().map(value_text),
                category: group,
                help_link: helplink.filter(|s| !s.is_empty()),
            }),
        }
    }
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_decoder_rejects_html() {
        let err = JsonDecoder::<serde_json::Value>::new()
            .decode("<html><body>login</body></html>")
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "got {err:?}");
    }

    #[test]
    fn port_overview_needs_data_envelope() {
        let err = PortOverviewDecoder.decode(r#"{"devices":[]}"#).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn port_overview_decodes_devices_and_rules() {
        let body = json!({
            "data": {
                "devices": [{
                    "UID": "landevice7",
                    "devicename": "server",
                    "local_ipv4": "192.168.178.20",
                    "rules": [
                        { "UID": "rule1", "fwport": "80", "fwendport": "80", "port": "80",
                          "endport": "80", "protocol": "TCP", "app": "HTTP-Server" },
                        { "UID": "rule2", "fwport": "22", "fwendport": "22", "port": "2222",
                          "protocol": "TCP", "app": "ssh" }
                    ]
                }]
            }
        })
        .to_string();

        let overview = PortOverviewDecoder.decode(&body).unwrap();
        assert_eq!(overview.devices.len(), 1);
        let device = &overview.devices[0];
        assert_eq!(device.name, "server");
        assert_eq!(device.rules.len(), 2);
        let (index, rule) = device.find_rule(2222).unwrap();
        assert_eq!(index, 1);
        assert_eq!(rule.uid, "rule2");
        assert_eq!(rule.forward_port, Some(22));
    }

    #[test]
    fn apply_rule_status() {
        let ok = ApplyRuleDecoder
            .decode(r#"{"data":{"apply_rule":"ok"}}"#)
            .unwrap();
        assert_eq!(ok, "ok");
        assert!(ApplyRuleDecoder.decode(r#"{"data":{}}"#).is_err());
    }

    #[test]
    fn tam_ack_accepts_numbers_bools_and_strings() {
        assert_eq!(TamAckDecoder.decode(r#"{"switch_on":1}"#).unwrap(), Some(true));
        assert_eq!(TamAckDecoder.decode(r#"{"switch_on":false}"#).unwrap(), Some(false));
        assert_eq!(TamAckDecoder.decode(r#"{"switch_on":"0"}"#).unwrap(), Some(false));
        assert_eq!(TamAckDecoder.decode(r#"{"other":1}"#).unwrap(), None);
        assert!(TamAckDecoder.decode("not json").is_err());
    }

    #[test]
    fn logbook_accepts_rows_and_objects() {
        let body = json!({
            "data": {
                "log": [
                    ["19.10.26", "08:15:02", "Internetverbindung wurde erfolgreich hergestellt.", "23", "1", "help.lua?helppage=x"],
                    { "date": "19.10.26", "time": "08:14:58", "msg": "DSL ist verfügbar", "id": 505, "group": "net" }
                ]
            }
        })
        .to_string();

        let log = LogbookDecoder.decode(&body).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].time, "08:15:02");
        assert_eq!(log[0].code.as_deref(), Some("23"));
        assert_eq!(log[1].code.as_deref(), Some("505"));
        assert_eq!(log[1].category.as_deref(), Some("net"));
        assert!(log[1].help_link.is_none());
    }

    #[test]
    fn logbook_rejects_short_rows() {
        let body = r#"{"data":{"log":[["19.10.26"]]}}"#;
        assert!(LogbookDecoder.decode(body).is_err());
    }
}
