//! Clap derive structures for the `medsync` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Kept free of crate-internal imports so `build.rs` can include it for
//! man page generation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// medsync -- medical-supply inventory across a facility network
#[derive(Debug, Parser)]
#[command(
    name = "medsync",
    version,
    about = "Track medical-supply stock across a facility network",
    long_about = "Inspect stock runway, patient census, and supply trends for a network of\n\
        facilities, run the consumption simulator, and replay scripted offline\n\
        sessions against the synchronization engine.",
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
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "MEDSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Network seed file, JSON or TOML (overrides config)
    #[arg(long, env = "MEDSYNC_SEED", global = true)]
    pub seed: Option<PathBuf>,

    /// Output format (overrides config)
    #[arg(long, short = 'o', env = "MEDSYNC_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output (overrides config)
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stock level, runway, and status for every item
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Network-wide patient census per date
    Census(CensusArgs),

    /// Network-wide history for one supply category
    Trend(TrendArgs),

    /// Run the consumption simulator and stream the log
    #[command(alias = "sim")]
    Simulate(SimulateArgs),

    /// Run a JSON script of engine commands and waits
    Replay(ReplayArgs),

    /// Print the analysis brief sent to the analyst
    Brief,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Reports ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Only items in this facility
    #[arg(long, short = 'f')]
    pub facility: Option<String>,

    /// Only items with critical or low runway
    #[arg(long, short = 'a', conflicts_with = "status")]
    pub attention: bool,

    /// Only one supply category (e.g. oxygen, insulin)
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Only items at this runway status
    #[arg(long, short = 's')]
    pub status: Option<StatusLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusLevel {
    Critical,
    Low,
    Adequate,
}

#[derive(Debug, Args)]
pub struct CensusArgs {
    /// Sort dates chronologically instead of first-seen order
    #[arg(long)]
    pub sorted: bool,
}

#[derive(Debug, Args)]
pub struct TrendArgs {
    /// Supply category (e.g. fluids, oxygen, o2, insulin)
    pub category: String,
}

// ── Engine runs ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// How long to run (e.g. 30s, 2m, 500ms)
    #[arg(long, short = 'd', default_value = "30s")]
    pub duration: humantime::Duration,

    /// Fixed simulator seed (overrides config)
    #[arg(long)]
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Script file: a JSON array of steps, each `{"command": {...}}` or `{"wait_ms": N}`
    pub script: PathBuf,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
