// Login page decoding
//
// Both login pages answer with the same document:
// <SessionInfo><SID>..</SID><Challenge>..</Challenge><BlockTime>..</BlockTime></SessionInfo>

use crate::auth::SessionId;
use crate::decode::Decoder;
use crate::error::Error;

/// Session state reported by the login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub sid: SessionId,
    pub challenge: String,
    /// Seconds the router refuses logins after failed attempts.
    pub block_time: Option<u32>,
}

/// `SessionInfo` XML. Anything else is a [`Error::Protocol`].
pub struct SessionInfoDecoder;

impl Decoder for SessionInfoDecoder {
    type Output = SessionInfo;

    fn decode(&self, body: &str) -> Result<SessionInfo, Error> {
        let doc = roxmltree::Document::parse(body.trim_start()).map_err(|e| Error::Protocol {
            message: format!("non-XML login response: {e}"),
        })?;

        let text = |tag: &str| {
            doc.descendants()
                .find(|n| n.has_tag_name(tag))
                .map(|n| n.text().unwrap_or_default().trim().to_owned())
        };

        let raw_sid = text("SID").ok_or_else(|| Error::Protocol {
            message: "login response has no SID".into(),
        })?;
        let sid = SessionId::parse(&raw_sid).ok_or_else(|| Error::Protocol {
            message: format!("malformed SID in login response: {raw_sid:?}"),
        })?;

        Ok(SessionInfo {
            sid,
            challenge: text("Challenge").unwrap_or_default(),
            block_time: text("BlockTime").and_then(|t| t.parse().ok()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_lua_session_info() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<SessionInfo><SID>0000000000000000</SID><Challenge>1234567z</Challenge><BlockTime>0</BlockTime><Rights></Rights></SessionInfo>"#;
        let info = SessionInfoDecoder.decode(body).unwrap();
        assert!(info.sid.is_none());
        assert_eq!(info.challenge, "1234567z");
        assert_eq!(info.block_time, Some(0));
    }

    #[test]
    fn decodes_legacy_session_info_with_sid() {
        let body = "\n<SessionInfo><iswriteaccess>1</iswriteaccess><SID>9a0b1c2d3e4f5a6b</SID><Challenge>ab12cd34</Challenge></SessionInfo>";
        let info = SessionInfoDecoder.decode(body).unwrap();
        assert_eq!(info.sid.as_str(), "9a0b1c2d3e4f5a6b");
        assert!(info.block_time.is_none());
    }

    #[test]
    fn html_is_a_protocol_error() {
        let err = SessionInfoDecoder
            .decode("<html><body><p>Fehler</p></body>")
            .unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }), "got {err:?}");
    }

    #[test]
    fn missing_sid_is_a_protocol_error() {
        let err = SessionInfoDecoder
            .decode("<SessionInfo><Challenge>x</Challenge></SessionInfo>")
            .unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }
}
