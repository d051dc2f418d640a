//! Clap derive structures for the `fritzbox` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. Only
//! depends on clap so `build.rs` can include it for man page generation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fritzbox -- talk to an AVM Fritz!Box through its web interface
#[derive(Debug, Parser)]
#[command(
    name = "fritzbox",
    version,
    about = "Manage a Fritz!Box router from the command line",
    long_about = "Logs in to the Fritz!Box web interface (challenge-response session),\n\
        runs one operation and logs out again.\n\n\
        Port sharing, answering machines, online counter and DSL statistics,\n\
        the system logbook and the call list are supported.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file to use instead of the platform default
    #[arg(long, short = 'C', env = "FRITZBOX_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Router host name or IP, optionally with :port (overrides config)
    #[arg(long, short = 'H', global = true)]
    pub host: Option<String>,

    /// Force remote (https) access mode
    #[arg(long, global = true, conflicts_with = "local")]
    pub remote: bool,

    /// Force local (http) access mode
    #[arg(long, global = true)]
    pub local: bool,

    /// Web UI user name
    #[arg(long, short = 'u', global = true)]
    pub username: Option<String>,

    /// Login page the firmware speaks
    #[arg(long, value_enum, global = true)]
    pub login_method: Option<LoginMethodArg>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FRITZBOX_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Where result messages go: console, silent, or a file path
    #[arg(long, global = true)]
    pub logging: Option<String>,

    /// Log every GET URL before it is sent
    #[arg(long, global = true)]
    pub log_requests: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LoginMethodArg {
    /// /login_sid.lua (FRITZ!OS 5.50 and later)
    Lua,
    /// ../html/login_sid.xml through webcm
    Legacy,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProtocolArg {
    Tcp,
    Udp,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PeriodArg {
    Today,
    Yesterday,
    Week,
    Month,
    LastMonth,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage port sharing rules
    #[command(alias = "p")]
    Ports(PortsArgs),

    /// Answering machines
    Tam(TamArgs),

    /// Online counter and DSL statistics
    Stats(StatsArgs),

    /// Show the system logbook
    Log,

    /// Show the home overview data
    Overview,

    /// Download or clear the call list
    Calls(CallsArgs),

    /// Inspect configuration and store passwords
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Ports ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PortsArgs {
    #[command(subcommand)]
    pub command: PortsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PortsCommand {
    /// List devices and their sharing rules
    #[command(alias = "ls")]
    List {
        /// Only show this device
        #[arg(long, short = 'd')]
        device: Option<String>,
    },

    /// Share a port range of a LAN device
    Add {
        /// Device name as shown in the web UI (case-insensitive)
        device: String,

        /// Port opened on the internet side
        external_port: u16,

        /// First forwarded port on the device
        start_port: u16,

        /// Last forwarded port on the device (defaults to start_port)
        end_port: Option<u16>,

        /// Rule name
        #[arg(long, default_value = "HTTP-Server")]
        description: String,

        #[arg(long, value_enum, default_value = "tcp")]
        protocol: ProtocolArg,
    },

    /// Remove the rule with the given external port
    #[command(alias = "rm")]
    Delete {
        /// Device name as shown in the web UI (case-insensitive)
        device: String,

        /// External port of the rule
        external_port: u16,
    },
}

// ── Answering machines ───────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TamArgs {
    #[command(subcommand)]
    pub command: TamCommand,
}

#[derive(Debug, Subcommand)]
pub enum TamCommand {
    /// Show which answering machines are switched on
    Status,

    /// Switch an answering machine on or off
    Set {
        /// Machine index, starting at 0
        index: usize,

        #[arg(value_enum)]
        state: Switch,
    },
}

// ── Statistics ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(subcommand)]
    pub command: StatsCommand,
}

#[derive(Debug, Subcommand)]
pub enum StatsCommand {
    /// Online counter table (online time, volume, connections)
    Online,

    /// Exact traffic volume for one period
    Volume {
        #[arg(long, short = 'p', value_enum, default_value = "today")]
        period: PeriodArg,
    },

    /// Yesterday's usage as one `;`-separated line, sent to the result log
    Daily,

    /// DSL spectrum data (JSON)
    Spectrum,

    /// DSL error statistics graph data (JSON)
    Graph,
}

// ── Call list ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CallsArgs {
    #[command(subcommand)]
    pub command: CallsCommand,
}

#[derive(Debug, Subcommand)]
pub enum CallsCommand {
    /// Save the call list as CSV
    Download {
        /// Target file (overrides call_list_path)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Clear the call list on the router
    Delete,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved configuration (passwords masked)
    Show,

    /// Print the config file path
    Path,

    /// Store a password in the system keyring
    SetPassword {
        /// Store the remote access password instead
        #[arg(long)]
        remote: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
