//! Answering machine command handlers.

use serde::Serialize;
use tabled::Tabled;

use fritzbox_api::{Session, TamToggle};

use crate::cli::{GlobalOpts, Switch, TamArgs, TamCommand};
use crate::error::CliError;
use crate::output;
use crate::report::Reporter;

#[derive(Serialize)]
struct Machine {
    index: usize,
    enabled: bool,
}

#[derive(Tabled)]
struct MachineRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "State")]
    state: &'static str,
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

pub fn handle(
    session: &Session,
    args: TamArgs,
    global: &GlobalOpts,
    reporter: &mut Reporter,
) -> Result<(), CliError> {
    match args.command {
        TamCommand::Status => {
            let machines: Vec<Machine> = session
                .tam_status()?
                .into_iter()
                .enumerate()
                .map(|(index, enabled)| Machine { index, enabled })
                .collect();
            let out = output::render_list(
                global.output,
                &machines,
                |m| MachineRow {
                    index: m.index,
                    state: on_off(m.enabled),
                },
                |m| format!("{} {}", m.index, on_off(m.enabled)),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TamCommand::Set { index, state } => {
            let enabled = matches!(state, Switch::On);
            match session.set_tam(index, enabled)? {
                TamToggle::Unchanged { enabled } => {
                    reporter.message(&format!(
                        "Answering machine {index} is already {}",
                        on_off(enabled)
                    ));
                    Ok(())
                }
                TamToggle::Switched { enabled } => {
                    reporter.message(&format!(
                        "Answering machine {index} switched {}",
                        on_off(enabled)
                    ));
                    Ok(())
                }
                TamToggle::Unacknowledged { requested } => {
                    reporter.message(&format!(
                        "Answering machine {index} toggled, the router did not confirm it is {}",
                        on_off(requested)
                    ));
                    Ok(())
                }
                TamToggle::Mismatch {
                    requested,
                    acknowledged,
                } => Err(CliError::Unconfirmed {
                    operation: format!("Switching answering machine {index} {}", on_off(requested)),
                    detail: format!("the router reports it {}", on_off(acknowledged)),
                }),
                TamToggle::NoSuchMachine { index, available } => Err(CliError::NotFound {
                    resource_type: "answering machine".into(),
                    identifier: format!("{index} (of {available})"),
                    list_command: "tam status".into(),
                }),
            }
        }
    }
}
