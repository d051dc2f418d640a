// Port sharing
//
// Rules are addressed by position inside the overview, and the router
// derives positions and counts server-side, so every mutation starts
// from a fresh overview.

use std::fmt;

use tracing::{debug, info};

use crate::decode::{
    ApplyRuleDecoder, Decoder, Device, PortOverview, PortOverviewDecoder, Protocol, Rule,
    RuleChange, RuleState,
};
use crate::error::Error;
use crate::session::{DATA_PAGE, Session};
use crate::transport::{Form, Transport};

/// A rule to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPortRule {
    pub description: String,
    pub external_port: u16,
    pub start_port: u16,
    pub end_port: u16,
    pub protocol: Protocol,
}

impl NewPortRule {
    /// A TCP rule named `HTTP-Server`, the name the web UI suggests.
    pub fn new(external_port: u16, start_port: u16, end_port: u16) -> Self {
        Self {
            description: "HTTP-Server".into(),
            external_port,
            start_port,
            end_port,
            protocol: Protocol::Tcp,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }
}

/// The `rule1` value of the portoverview form: fixed `key=value;` pairs in
/// the order the web UI sends them.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RuleDescription<'a> {
    uid: &'a str,
    app: &'a str,
    activated: &'a str,
    forward_port: Option<u16>,
    forward_end_port: Option<u16>,
    external_port: Option<u16>,
    scheme: &'a str,
    protocol: &'a str,
    state: RuleState,
    service_uid: &'a str,
}

impl<'a> RuleDescription<'a> {
    fn new_rule(rule: &'a NewPortRule, protocol: &'a str) -> Self {
        Self {
            uid: "newRule1",
            app: &rule.description,
            activated: "1",
            forward_port: Some(rule.start_port),
            forward_end_port: Some(rule.end_port),
            external_port: Some(rule.external_port),
            scheme: "undefined",
            protocol,
            state: RuleState::New,
            service_uid: "undefined",
        }
    }

    fn delete(rule: &'a Rule) -> Self {
        let protocol = if rule.protocol.is_empty() {
            "TCP"
        } else {
            &rule.protocol
        };
        Self {
            uid: &rule.uid,
            app: &rule.app,
            activated: "true",
            forward_port: rule.forward_port,
            forward_end_port: rule.forward_end_port,
            external_port: rule.external_end_port.or(rule.external_port),
            scheme: "",
            protocol,
            state: RuleState::Delete,
            service_uid: "",
        }
    }
}

impl fmt::Display for RuleDescription<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let port = |p: Option<u16>| p.map(|p| p.to_string()).unwrap_or_default();
        write!(
            f,
            "UID={};accesstype=ipv4;app={};description={};directory=;activated={};\
             fwport={};fwendport={};port={};myfritz_adr=;scheme={};protocol={};\
             rulestate={};type=port;myfritzdevice_uid=;myfritzservice_uid={};",
            self.uid,
            self.app,
            self.app,
            self.activated,
            port(self.forward_port),
            port(self.forward_end_port),
            port(self.external_port),
            self.scheme,
            self.protocol,
            self.state.as_str(),
            self.service_uid,
        )
    }
}

/// The form that applies one rule description to a device.
fn apply_form(rule_count: usize, description: &RuleDescription<'_>, device: &Device) -> Form {
    Form::new()
        .field("xhr", 1)
        .field("allow_pcp_and_upnp", 0)
        .field("exposed_ipv4", "off")
        .field("rulecount", rule_count)
        .field("rule1", description)
        .field("ipv4exposedhost_count", 0)
        .field("exposed_ipv4_node", "")
        .field("device", &device.uid)
        .field("local_ipv4", &device.local_ipv4)
        .field("landevice", &device.uid)
        .field("ipv6_rulenode", "")
        .field("isIpv6Active", "false")
        .field("ifaceid", ":::::")
        .field("edify", "")
        .field("page", "portoverview")
        .field("lang", "de")
}

impl<T: Transport> Session<T> {
    /// All LAN devices with their port sharing rules.
    pub fn port_overview(&self) -> Result<PortOverview, Error> {
        let form = Form::new()
            .field("page", "portoverview")
            .field("lang", "de")
            .field("xhr", 1)
            .field("xhrID", "all");
        let body = self.post_form(DATA_PAGE, &form)?;
        PortOverviewDecoder.decode(&body)
    }

    /// Share `rule` on the device called `device_name`.
    ///
    /// Succeeds only when the router's answer shows exactly one more
    /// rule on the device. An unknown device sends no mutating request.
    /// A draft answer without a status is `Rejected` with an empty
    /// status; an unreadable answer to the submit is `Unconfirmed`.
    pub fn add_port_sharing(
        &self,
        device_name: &str,
        rule: &NewPortRule,
    ) -> Result<RuleChange, Error> {
        let overview = self.port_overview()?;
        let Some((index, device)) = overview.find_device(device_name) else {
            info!(device = device_name, "no such device");
            return Ok(RuleChange::DeviceNotFound {
                device: device_name.to_owned(),
            });
        };
        let rule_count = device.rules.len();

        // Step 1: announce a new rule draft.
        let draft = Form::new()
            .field("xhr", 1)
            .field("sharingtype", "port")
            .field("description_portsharing", &rule.description)
            .field("start_portsharing", rule.start_port)
            .field("end_portsharing", rule.end_port)
            .field("port_portsharing", rule.external_port)
            .field("portsharing_activ", 1)
            .field("portsharingtype", "ipv4")
            .field("allow_pcp_and_upnp", 0)
            .field("exposed_ipv4", "off")
            .field("apply_rule", "")
            .field("page", "portoverview")
            .field("lang", "de");
        let status = match ApplyRuleDecoder.decode(&self.post_form(DATA_PAGE, &draft)?) {
            Ok(status) => status,
            Err(Error::Decode { message, .. }) => {
                info!(reason = %message, "rule draft answer carries no status");
                String::new()
            }
            Err(e) => return Err(e),
        };
        if status != "ok" {
            info!(status, "router rejected the rule draft");
            return Ok(RuleChange::Rejected { status });
        }

        // Step 2: submit the full rule.
        let protocol = rule.protocol.to_string();
        let description = RuleDescription::new_rule(rule, &protocol);
        let form = apply_form(rule_count, &description, device);
        debug!(device = %device.name, rule_count, "submitting new rule");
        let body = self.post_form(DATA_PAGE, &form)?;

        // Already submitted: an unreadable answer is unconfirmed, not an error.
        let expected = rule_count + 1;
        let actual = match PortOverviewDecoder.decode(&body) {
            Ok(after) => after.devices.get(index).map_or(0, |d| d.rules.len()),
            Err(Error::Decode { message, .. }) => {
                info!(reason = %message, "rule submitted but the answer has no overview");
                0
            }
            Err(e) => return Err(e),
        };
        if actual == expected {
            Ok(RuleChange::Added)
        } else {
            Ok(RuleChange::Unconfirmed { expected, actual })
        }
    }

    /// Remove the first rule on `device_name` whose external port is `port`.
    ///
    /// The router's answer is not checked; re-read the overview to confirm.
    pub fn delete_port_sharing(&self, device_name: &str, port: u16) -> Result<RuleChange, Error> {
        let overview = self.port_overview()?;
        let Some((_, device)) = overview.find_device(device_name) else {
            info!(device = device_name, "no such device");
            return Ok(RuleChange::DeviceNotFound {
                device: device_name.to_owned(),
            });
        };
        let Some((position, rule)) = device.find_rule(port) else {
            info!(device = device_name, port, "no rule for port");
            return Ok(RuleChange::RuleNotFound {
                device: device_name.to_owned(),
                port,
            });
        };

        let description = RuleDescription::delete(rule);
        let form = apply_form(position, &description, device);
        debug!(device = %device.name, rule = %rule.uid, "submitting rule deletion");
        self.post_form(DATA_PAGE, &form)?;
        Ok(RuleChange::Deleted)
    }
}
