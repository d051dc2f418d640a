// Markup scrapers
//
// These pages only exist as HTML (or HTML with inline JSON), so the
// values are pulled out with patterns tied to the exact markup the
// firmware emits.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::decode::{CounterPeriod, Decoder, OnlineCounterRow, TrafficVolume};
use crate::error::Error;

static TAM_SWITCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"id="uiSwitch([0-9])" class="switch_(off|on) "#).expect("valid TAM pattern")
});

static ONLINE_COUNTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?s)class="time">([0-9]+:[0-9]+)<"#,
        r#".*?gesamt\(MB\)"\s*class="vol[^"]*">([0-9]+)<"#,
        r#".*?gesendet\(MB\)"\s*class="vol[^"]*">([0-9]+)<"#,
        r#".*?empfangen\(MB\)"\s*class="vol[^"]*">([0-9]+)<"#,
        r#".*?class="conn">([0-9]+)<"#,
    ))
    .expect("valid online counter pattern")
});

static ERROR_MSG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<p class="ErrorMsg">(.*?)</p>"#).expect("valid error pattern")
});

static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#([0-9]{1,7});").expect("valid entity pattern"));

/// On/off state of every answering machine, in machine order.
///
/// A page without switches decodes to an empty list: no machines set up.
pub struct TamStatusDecoder;

impl Decoder for TamStatusDecoder {
    type Output = Vec<bool>;

    fn decode(&self, body: &str) -> Result<Vec<bool>, Error> {
        Ok(TAM_SWITCH
            .captures_iter(body)
            .map(|caps| &caps[2] == "on")
            .collect())
    }
}

/// Rows of the online counter page (`data.lua?page=netCnt`).
pub struct OnlineCounterDecoder;

impl Decoder for OnlineCounterDecoder {
    type Output = Vec<OnlineCounterRow>;

    fn decode(&self, body: &str) -> Result<Vec<OnlineCounterRow>, Error> {
        let matches: Vec<_> = ONLINE_COUNTER.captures_iter(body).collect();
        if matches.len() > CounterPeriod::ALL.len() {
            debug!(
                found = matches.len(),
                expected = CounterPeriod::ALL.len(),
                "online counter page has extra rows, ignoring the rest"
            );
        }

        let rows: Vec<OnlineCounterRow> = matches
            .iter()
            .zip(CounterPeriod::ALL)
            .map(|(caps, period)| {
                let number = |i: usize| caps[i].parse::<u64>();
                Ok::<_, std::num::ParseIntError>(OnlineCounterRow {
                    period,
                    online_time: caps[1].to_owned(),
                    total_mb: number(2)?,
                    sent_mb: number(3)?,
                    received_mb: number(4)?,
                    connections: number(5)?,
                })
            })
            .collect::<Result<_, _>>()
            .map_err(|e| Error::decode(format!("online counter value: {e}"), body))?;

        if rows.is_empty() {
            return Err(Error::decode("no online counter rows found", body));
        }
        Ok(rows)
    }
}

/// Traffic counters for one period from the inline
/// `"<Period>":{"BytesSentHigh":"..",...}` object of the counter page.
pub struct TrafficVolumeDecoder {
    period: CounterPeriod,
}

impl TrafficVolumeDecoder {
    pub fn new(period: CounterPeriod) -> Self {
        Self { period }
    }
}

impl Decoder for TrafficVolumeDecoder {
    type Output = TrafficVolume;

    fn decode(&self, body: &str) -> Result<TrafficVolume, Error> {
        let pattern = format!(
            r#""{}":\{{"BytesSentHigh":"(\d+)","BytesSentLow":"(\d+)","BytesReceivedHigh":"(\d+)","BytesReceivedLow":"(\d+)"\}}"#,
            regex::escape(self.period.volume_key())
        );
        let re = Regex::new(&pattern).map_err(|e| Error::decode(e.to_string(), body))?;
        let caps = re.captures(body).ok_or_else(|| {
            Error::decode(format!("no traffic counters for {}", self.period), body)
        })?;

        let join = |high: usize, low: usize| -> Option<u64> {
            let high: u64 = caps[high].parse().ok()?;
            let low: u64 = caps[low].parse().ok()?;
            high.checked_mul(1 << 32)?.checked_add(low)
        };
        let overflow = || Error::decode("traffic counter out of range", body);

        Ok(TrafficVolume {
            sent_bytes: join(1, 2).ok_or_else(overflow)?,
            received_bytes: join(3, 4).ok_or_else(overflow)?,
        })
    }
}

/// The call list CSV. An empty answer means the download failed.
pub struct CallListDecoder;

impl Decoder for CallListDecoder {
    type Output = String;

    fn decode(&self, body: &str) -> Result<String, Error> {
        if body.trim().is_empty() {
            return Err(Error::decode("empty call list", body));
        }
        Ok(body.to_owned())
    }
}

/// Message of a `<p class="ErrorMsg">` paragraph, entity-decoded.
pub fn error_message(body: &str) -> Option<String> {
    let caps = ERROR_MSG.captures(body)?;
    Some(decode_entities(caps[1].trim()))
}

/// Decode the handful of HTML entities the web UI uses in messages.
pub fn decode_entities(raw: &str) -> String {
    let named = raw
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'");
    let numeric = NUMERIC_ENTITY.replace_all(&named, |caps: &regex::Captures<'_>| {
        caps[1]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map_or_else(|| caps[0].to_owned(), String::from)
    });
    // `&amp;` last so "&amp;lt;" stays "&lt;".
    numeric.replace("&amp;", "&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const TAM_PAGE: &str = r##"
        <tr><td><a id="uiSwitch0" class="switch_on " href="#"></a></td><td>Anrufbeantworter</td></tr>
        <tr><td><a id="uiSwitch1" class="switch_off " href="#"></a></td><td>Büro</td></tr>
        <tr><td><a id="uiSwitch2" class="switch_on " href="#"></a></td><td>Privat</td></tr>
    "##;

    #[test]
    fn tam_switches_in_order() {
        assert_eq!(TamStatusDecoder.decode(TAM_PAGE).unwrap(), vec![true, false, true]);
    }

    #[test]
    fn tam_page_without_switches_is_empty() {
        assert!(TamStatusDecoder.decode("<div>Kein Anrufbeantworter</div>").unwrap().is_empty());
    }

    fn counter_row(time: &str, total: u32, sent: u32, received: u32, conn: u32) -> String {
        format!(
            r#"<tr><td class="time">{time}</td>
            <td datalabel="Datenvolumen gesamt(MB)" class="vol vol-sum">{total}</td>
            <td datalabel="Datenvolumen gesendet(MB)" class="vol">{sent}</td>
            <td datalabel="Datenvolumen empfangen(MB)" class="vol">{received}</td>
            <td class="conn">{conn}</td></tr>"#
        )
    }

    #[test]
    fn online_counter_rows_get_periods_in_order() {
        let page = [
            counter_row("05:12", 300, 100, 200, 3),
            counter_row("24:00", 4000, 1000, 3000, 1),
            counter_row("100:30", 20000, 5000, 15000, 9),
        ]
        .concat();

        let rows = OnlineCounterDecoder.decode(&page).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].period, CounterPeriod::Today);
        assert_eq!(rows[0].online_time, "05:12");
        assert_eq!(rows[0].total_mb, 300);
        assert_eq!(rows[1].period, CounterPeriod::Yesterday);
        assert_eq!(rows[1].received_mb, 3000);
        assert_eq!(rows[1].connections, 1);
        assert_eq!(rows[2].period, CounterPeriod::CurrentWeek);
        assert_eq!(rows[2].online_time, "100:30");
    }

    #[test]
    fn online_counter_ignores_rows_past_last_month() {
        let page = (0..7u32)
            .map(|i| counter_row("01:00", i, 0, i, i))
            .collect::<String>();

        let rows = OnlineCounterDecoder.decode(&page).unwrap();
        assert_eq!(rows.len(), CounterPeriod::ALL.len());
        assert_eq!(rows[4].period, CounterPeriod::LastMonth);
        assert_eq!(rows[4].connections, 4);
    }

    #[test]
    fn online_counter_rejects_unrelated_page() {
        let err = OnlineCounterDecoder.decode("<html>Anmeldung</html>").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn traffic_volume_joins_high_and_low() {
        let page = r#"<script>const data = {"Today":{"BytesSentHigh":"0","BytesSentLow":"1","BytesReceivedHigh":"0","BytesReceivedLow":"2"},"Yesterday":{"BytesSentHigh":"1","BytesSentLow":"5","BytesReceivedHigh":"0","BytesReceivedLow":"3000000"}};</script>"#;
        let volume = TrafficVolumeDecoder::new(CounterPeriod::Yesterday)
            .decode(page)
            .unwrap();
        assert_eq!(volume.sent_bytes, (1 << 32) + 5);
        assert_eq!(volume.received_bytes, 3_000_000);
        assert_eq!(volume.received_mb(), 3);
    }

    #[test]
    fn traffic_volume_missing_period() {
        let page = r#"{"Today":{"BytesSentHigh":"0","BytesSentLow":"1","BytesReceivedHigh":"0","BytesReceivedLow":"2"}}"#;
        assert!(
            TrafficVolumeDecoder::new(CounterPeriod::LastMonth)
                .decode(page)
                .is_err()
        );
    }

    #[test]
    fn call_list_must_not_be_empty() {
        assert!(CallListDecoder.decode("  \n").is_err());
        assert_eq!(
            CallListDecoder.decode("sep=;\nTyp;Datum\n").unwrap(),
            "sep=;\nTyp;Datum\n"
        );
    }

    #[test]
    fn error_message_is_entity_decoded() {
        let body = r#"<div><p class="ErrorMsg">Das&nbsp;Kennwort ist&nbsp;falsch &amp; &#252;berholt</p></div>"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Das Kennwort ist falsch & überholt")
        );
        assert!(error_message("<p>all good</p>").is_none());
    }

    #[test]
    fn amp_is_decoded_last() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }
}
