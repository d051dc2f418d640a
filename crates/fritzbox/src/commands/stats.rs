//! Statistics and logbook command handlers.

use tabled::Tabled;

use fritzbox_api::{CounterPeriod, LogEntry, OnlineCounterRow, Session, TrafficVolume};

use crate::cli::{GlobalOpts, PeriodArg, StatsArgs, StatsCommand};
use crate::error::CliError;
use crate::output;
use crate::report::Reporter;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct CounterRow {
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Online")]
    online_time: String,
    #[tabled(rename = "Total MB")]
    total: u64,
    #[tabled(rename = "Sent MB")]
    sent: u64,
    #[tabled(rename = "Received MB")]
    received: u64,
    #[tabled(rename = "Connections")]
    connections: u64,
}

impl From<&OnlineCounterRow> for CounterRow {
    fn from(r: &OnlineCounterRow) -> Self {
        Self {
            period: r.period.to_string(),
            online_time: r.online_time.clone(),
            total: r.total_mb,
            sent: r.sent_mb,
            received: r.received_mb,
            connections: r.connections,
        }
    }
}

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&LogEntry> for LogRow {
    fn from(e: &LogEntry) -> Self {
        Self {
            date: e.date.clone(),
            time: e.time.clone(),
            message: e.message.clone(),
        }
    }
}

fn period(arg: PeriodArg) -> CounterPeriod {
    match arg {
        PeriodArg::Today => CounterPeriod::Today,
        PeriodArg::Yesterday => CounterPeriod::Yesterday,
        PeriodArg::Week => CounterPeriod::CurrentWeek,
        PeriodArg::Month => CounterPeriod::CurrentMonth,
        PeriodArg::LastMonth => CounterPeriod::LastMonth,
    }
}

fn volume_detail(period: CounterPeriod, v: &TrafficVolume) -> String {
    [
        format!("Period:    {period}"),
        format!("Sent:      {} MB ({} bytes)", v.sent_mb(), v.sent_bytes),
        format!("Received:  {} MB ({} bytes)", v.received_mb(), v.received_bytes),
        format!("Total:     {} MB", v.total_mb()),
    ]
    .join("\n")
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn handle(
    session: &Session,
    args: StatsArgs,
    global: &GlobalOpts,
    reporter: &mut Reporter,
) -> Result<(), CliError> {
    let out = match args.command {
        StatsCommand::Online => {
            let rows = session.online_counter()?;
            output::render_list(
                global.output,
                &rows,
                |r| CounterRow::from(r),
                |r| {
                    format!(
                        "{};{};{};{};{};{}",
                        r.period, r.online_time, r.total_mb, r.sent_mb, r.received_mb, r.connections
                    )
                },
            )
        }

        StatsCommand::Volume { period: arg } => {
            let period = period(arg);
            let volume = session.traffic_volume(period)?;
            output::render_single(
                global.output,
                &volume,
                |v| volume_detail(period, v),
                |v| format!("{};{};{}", v.sent_mb(), v.received_mb(), v.total_mb()),
            )
        }

        StatsCommand::Daily => {
            let usage = session.yesterday_usage()?;
            reporter.message(&usage.to_csv_line());
            return Ok(());
        }

        StatsCommand::Spectrum => output::render_value(global.output, &session.dsl_spectrum()?),

        StatsCommand::Graph => output::render_value(global.output, &session.dsl_stats()?),
    };

    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn logbook(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let entries = session.logbook()?;
    let out = output::render_list(
        global.output,
        &entries,
        |e| LogRow::from(e),
        |e| format!("{} {} {}", e.date, e.time, e.message),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
