//! Port sharing command handlers.

use serde::Serialize;
use tabled::Tabled;

use fritzbox_api::{NewPortRule, PortOverview, Protocol, Rule, RuleChange, Session};

use crate::cli::{GlobalOpts, PortsArgs, PortsCommand, ProtocolArg};
use crate::error::CliError;
use crate::output;
use crate::report::Reporter;

// ── Table row ───────────────────────────────────────────────────────

/// One rule with the device it belongs to.
#[derive(Serialize)]
struct SharedPort<'a> {
    device: &'a str,
    local_ipv4: &'a str,
    #[serde(flatten)]
    rule: &'a Rule,
}

#[derive(Tabled)]
struct SharedPortRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Name")]
    app: String,
    #[tabled(rename = "Proto")]
    protocol: String,
    #[tabled(rename = "External")]
    external: String,
    #[tabled(rename = "Forwarded")]
    forwarded: String,
    #[tabled(rename = "UID")]
    uid: String,
}

impl From<&SharedPort<'_>> for SharedPortRow {
    fn from(p: &SharedPort<'_>) -> Self {
        Self {
            device: p.device.to_owned(),
            ip: p.local_ipv4.to_owned(),
            app: p.rule.app.clone(),
            protocol: p.rule.protocol.clone(),
            external: port_range(p.rule.external_port, p.rule.external_end_port),
            forwarded: port_range(p.rule.forward_port, p.rule.forward_end_port),
            uid: p.rule.uid.clone(),
        }
    }
}

fn port_range(start: Option<u16>, end: Option<u16>) -> String {
    match (start, end) {
        (Some(s), Some(e)) if e != s => format!("{s}-{e}"),
        (Some(s), _) => s.to_string(),
        (None, _) => "-".into(),
    }
}

fn shared_ports<'a>(overview: &'a PortOverview, device: Option<&str>) -> Vec<SharedPort<'a>> {
    overview
        .devices
        .iter()
        .filter(|d| device.is_none_or(|name| d.name.to_lowercase() == name.to_lowercase()))
        .flat_map(|d| {
            d.rules.iter().map(move |rule| SharedPort {
                device: &d.name,
                local_ipv4: &d.local_ipv4,
                rule,
            })
        })
        .collect()
}

fn device_not_found(device: String) -> CliError {
    CliError::NotFound {
        resource_type: "device".into(),
        identifier: device,
        list_command: "ports list".into(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    session: &Session,
    args: PortsArgs,
    global: &GlobalOpts,
    reporter: &mut Reporter,
) -> Result<(), CliError> {
    match args.command {
        PortsCommand::List { device } => {
            let overview = session.port_overview()?;
            if let Some(ref name) = device {
                if overview.find_device(name).is_none() {
                    return Err(device_not_found(name.clone()));
                }
            }
            let ports = shared_ports(&overview, device.as_deref());
            let out = output::render_list(
                global.output,
                &ports,
                |p| SharedPortRow::from(p),
                |p| {
                    format!(
                        "{} {} {}:{}",
                        p.device,
                        port_range(p.rule.external_port, p.rule.external_end_port),
                        p.local_ipv4,
                        port_range(p.rule.forward_port, p.rule.forward_end_port)
                    )
                },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PortsCommand::Add {
            device,
            external_port,
            start_port,
            end_port,
            description,
            protocol,
        } => {
            let end_port = end_port.unwrap_or(start_port);
            if end_port < start_port {
                return Err(CliError::Validation {
                    field: "end_port".into(),
                    reason: format!("{end_port} is below start port {start_port}"),
                });
            }
            let rule = NewPortRule::new(external_port, start_port, end_port)
                .with_description(description)
                .with_protocol(match protocol {
                    ProtocolArg::Tcp => Protocol::Tcp,
                    ProtocolArg::Udp => Protocol::Udp,
                });

            let change = session.add_port_sharing(&device, &rule)?;
            confirm("Adding the port sharing rule", change)?;
            reporter.message(&format!(
                "Port sharing {external_port} -> {device}:{} added",
                port_range(Some(start_port), Some(end_port))
            ));
            Ok(())
        }

        PortsCommand::Delete {
            device,
            external_port,
        } => {
            let change = session.delete_port_sharing(&device, external_port)?;
            confirm("Deleting the port sharing rule", change)?;
            reporter.message(&format!("Port sharing {external_port} on {device} deleted"));
            Ok(())
        }
    }
}

/// Turn every outcome except `Added`/`Deleted` into an error.
fn confirm(operation: &str, change: RuleChange) -> Result<(), CliError> {
    let err = match change {
        RuleChange::Added | RuleChange::Deleted => return Ok(()),
        RuleChange::DeviceNotFound { device } => device_not_found(device),
        RuleChange::RuleNotFound { device, port } => CliError::NotFound {
            resource_type: "port sharing rule".into(),
            identifier: format!("{device}:{port}"),
            list_command: format!("ports list --device {device}"),
        },
        RuleChange::Rejected { status } if status.is_empty() => CliError::Router {
            message: format!("{operation} was rejected"),
        },
        RuleChange::Rejected { status } => CliError::Router {
            message: format!("{operation} was rejected ({status})"),
        },
        RuleChange::Unconfirmed { expected, actual } => CliError::Unconfirmed {
            operation: operation.to_owned(),
            detail: format!("expected {expected} rules on the device, found {actual}"),
        },
    };
    Err(err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn overview() -> PortOverview {
        serde_json::from_value(serde_json::json!({
            "devices": [
                { "UID": "landevice1", "devicename": "nas", "local_ipv4": "192.168.178.7",
                  "rules": [{ "UID": "rule1", "port": "2222", "fwport": "22", "fwendport": "22",
                              "protocol": "TCP", "app": "ssh" }] },
                { "UID": "landevice2", "devicename": "pi", "local_ipv4": "192.168.178.8",
                  "rules": [{ "UID": "rule2", "port": "8000", "endport": "8010",
                              "fwport": "8000", "fwendport": "8010", "protocol": "UDP", "app": "game" }] }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn ranges_collapse_single_ports() {
        assert_eq!(port_range(Some(22), Some(22)), "22");
        assert_eq!(port_range(Some(8000), Some(8010)), "8000-8010");
        assert_eq!(port_range(None, None), "-");
    }

    #[test]
    fn device_filter_is_case_insensitive() {
        let overview = overview();
        let ports = shared_ports(&overview, Some("PI"));
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].rule.uid, "rule2");
        assert_eq!(shared_ports(&overview, None).len(), 2);
    }

    #[test]
    fn missing_rule_maps_to_not_found() {
        let err = confirm(
            "Deleting",
            RuleChange::RuleNotFound {
                device: "nas".into(),
                port: 1,
            },
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_code::NOT_FOUND);
    }

    #[test]
    fn only_added_and_deleted_confirm() {
        assert!(confirm("Adding", RuleChange::Added).is_ok());
        assert!(confirm("Deleting", RuleChange::Deleted).is_ok());

        let err = confirm(
            "Adding",
            RuleChange::Unconfirmed {
                expected: 2,
                actual: 0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Unconfirmed { .. }));
        assert!(err.to_string().contains("expected 2 rules on the device, found 0"));

        let err = confirm(
            "Adding",
            RuleChange::Rejected {
                status: String::new(),
            },
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_code::GENERAL);
    }
}
