// Response types
//
// Typed snapshots of what the web UI returns. `data.lua` is loose about
// types: ports arrive as strings or numbers, sometimes empty, so the
// port fields go through a lenient deserializer.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ── Port sharing ─────────────────────────────────────────────────────

/// `data.lua?page=portoverview` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortOverview {
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl PortOverview {
    /// Case-insensitive exact name match; first match wins.
    pub fn find_device(&self, name: &str) -> Option<(usize, &Device)> {
        let wanted = name.to_lowercase();
        self.devices
            .iter()
            .enumerate()
            .find(|(_, d)| d.name.to_lowercase() == wanted)
    }
}

/// A LAN device with its sharing rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename(deserialize = "UID"))]
    pub uid: String,
    #[serde(rename(deserialize = "devicename"))]
    pub name: String,
    #[serde(default)]
    pub local_ipv4: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Device {
    /// First rule whose external port equals `port`.
    pub fn find_rule(&self, port: u16) -> Option<(usize, &Rule)> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, r)| r.external_port == Some(port))
    }
}

/// One port sharing rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename(deserialize = "UID"))]
    pub uid: String,
    #[serde(default, rename(deserialize = "fwport"), deserialize_with = "lenient_port")]
    pub forward_port: Option<u16>,
    #[serde(default, rename(deserialize = "fwendport"), deserialize_with = "lenient_port")]
    pub forward_end_port: Option<u16>,
    #[serde(default, rename(deserialize = "port"), deserialize_with = "lenient_port")]
    pub external_port: Option<u16>,
    #[serde(default, rename(deserialize = "endport"), deserialize_with = "lenient_port")]
    pub external_end_port: Option<u16>,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub app: String,
    #[serde(default, rename(deserialize = "rulestate"))]
    pub state: RuleState,
}

/// Lifecycle marker the UI attaches to rules it submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleState {
    New,
    Delete,
    #[default]
    #[serde(other)]
    Active,
}

impl RuleState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Active => "active",
            Self::Delete => "delete",
        }
    }
}

/// Transport protocol of a sharing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        })
    }
}

fn lenient_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u16),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid port '{s}'"))),
    }
}

/// Outcome of a port sharing mutation that did not raise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuleChange {
    /// The rule was added and the device's rule count went up by one.
    Added,
    /// The delete was submitted. The router's answer is not checked.
    Deleted,
    DeviceNotFound { device: String },
    RuleNotFound { device: String, port: u16 },
    /// The router did not accept the new-rule draft.
    Rejected { status: String },
    /// The rule was submitted but the rule count did not match afterwards.
    Unconfirmed { expected: usize, actual: usize },
}

// ── Answering machines ───────────────────────────────────────────────

/// Outcome of switching an answering machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TamToggle {
    /// Already in the requested state, nothing was sent.
    Unchanged { enabled: bool },
    /// Toggled and the router acknowledged the requested state.
    Switched { enabled: bool },
    /// Toggled but the router reports the other state.
    Mismatch { requested: bool, acknowledged: bool },
    /// Toggled but the answer carried no state. The switch may or may
    /// not have happened.
    Unacknowledged { requested: bool },
    NoSuchMachine { index: usize, available: usize },
}

// ── Statistics ───────────────────────────────────────────────────────

/// Rows of the online counter page, in page order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterPeriod {
    Today,
    Yesterday,
    CurrentWeek,
    CurrentMonth,
    LastMonth,
}

impl CounterPeriod {
    pub const ALL: [Self; 5] = [
        Self::Today,
        Self::Yesterday,
        Self::CurrentWeek,
        Self::CurrentMonth,
        Self::LastMonth,
    ];

    /// Key used in the embedded traffic counter JSON.
    pub fn volume_key(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::CurrentWeek => "ThisWeek",
            Self::CurrentMonth => "ThisMonth",
            Self::LastMonth => "LastMonth",
        }
    }
}

impl fmt::Display for CounterPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::CurrentWeek => "current week",
            Self::CurrentMonth => "current month",
            Self::LastMonth => "last month",
        })
    }
}

/// One row of the online counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnlineCounterRow {
    pub period: CounterPeriod,
    /// `hh:mm`
    pub online_time: String,
    pub total_mb: u64,
    pub sent_mb: u64,
    pub received_mb: u64,
    pub connections: u64,
}

/// Byte counters for one period, joined from 32-bit high/low halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrafficVolume {
    pub sent_bytes: u64,
    pub received_bytes: u64,
}

impl TrafficVolume {
    pub fn sent_mb(&self) -> u64 {
        to_mb(self.sent_bytes)
    }

    pub fn received_mb(&self) -> u64 {
        to_mb(self.received_bytes)
    }

    pub fn total_mb(&self) -> u64 {
        self.sent_mb().saturating_add(self.received_mb())
    }
}

/// Decimal megabytes, rounded half up.
fn to_mb(bytes: u64) -> u64 {
    bytes / 1_000_000 + u64::from(bytes % 1_000_000 >= 500_000)
}

/// Yesterday's usage, one line of the daily statistics log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyUsage {
    pub date: String,
    pub online_time: String,
    pub total_mb: u64,
    pub download_mb: u64,
    pub upload_mb: u64,
    pub connections: u64,
}

impl DailyUsage {
    /// `date;online;total;download;upload;connections`
    pub fn to_csv_line(&self) -> String {
        format!(
            "{};{};{};{};{};{}",
            self.date,
            self.online_time,
            self.total_mb,
            self.download_mb,
            self.upload_mb,
            self.connections
        )
    }
}

// ── Logbook ──────────────────────────────────────────────────────────

/// One logbook line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub date: String,
    pub time: String,
    pub message: String,
    pub code: Option<String>,
    pub category: Option<String>,
    pub help_link: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rule_ports_accept_strings_numbers_and_blanks() {
        let rule: Rule = serde_json::from_value(json!({
            "UID": "rule1",
            "fwport": "8080",
            "fwendport": 8081,
            "port": "",
            "protocol": "TCP"
        }))
        .unwrap();
        assert_eq!(rule.forward_port, Some(8080));
        assert_eq!(rule.forward_end_port, Some(8081));
        assert_eq!(rule.external_port, None);
        assert_eq!(rule.state, RuleState::Active);
    }

    #[test]
    fn rule_rejects_garbage_port() {
        let rule = serde_json::from_value::<Rule>(json!({ "UID": "r", "port": "http" }));
        assert!(rule.is_err());
    }

    #[test]
    fn unknown_rule_state_is_active() {
        let rule: Rule =
            serde_json::from_value(json!({ "UID": "r", "rulestate": "whatever" })).unwrap();
        assert_eq!(rule.state, RuleState::Active);
        let rule: Rule = serde_json::from_value(json!({ "UID": "r", "rulestate": "new" })).unwrap();
        assert_eq!(rule.state, RuleState::New);
        let rule: Rule =
            serde_json::from_value(json!({ "UID": "r", "rulestate": "delete" })).unwrap();
        assert_eq!(rule.state, RuleState::Delete);
    }

    #[test]
    fn find_device_ignores_case() {
        let overview: PortOverview = serde_json::from_value(json!({
            "devices": [
                { "UID": "landevice1", "devicename": "NAS", "local_ipv4": "192.168.178.2" },
                { "UID": "landevice2", "devicename": "nas", "local_ipv4": "192.168.178.3" }
            ]
        }))
        .unwrap();
        let (index, device) = overview.find_device("Nas").unwrap();
        assert_eq!(index, 0);
        assert_eq!(device.uid, "landevice1");
        assert!(overview.find_device("printer").is_none());
    }

    #[test]
    fn traffic_volume_rounds_to_decimal_megabytes() {
        let volume = TrafficVolume {
            sent_bytes: 1_499_999,
            received_bytes: (1 << 32) + 500_000,
        };
        assert_eq!(volume.sent_mb(), 1);
        assert_eq!(volume.received_mb(), 4295);
        assert_eq!(volume.total_mb(), 4296);
    }

    #[test]
    fn traffic_volume_near_u64_max_does_not_overflow() {
        let volume = TrafficVolume {
            sent_bytes: u64::MAX,
            received_bytes: u64::MAX - 1,
        };
        assert_eq!(volume.sent_mb(), u64::MAX / 1_000_000 + 1);
        assert_eq!(volume.received_mb(), u64::MAX / 1_000_000 + 1);
        assert_eq!(volume.total_mb(), 2 * (u64::MAX / 1_000_000 + 1));
    }
}
