//! Command dispatch: bridges CLI args -> engine -> output formatting.

pub mod brief;
pub mod census;
pub mod config_cmd;
pub mod replay;
pub mod simulate;
pub mod status;
pub mod trend;

use std::sync::Arc;

use tabled::Tabled;

use medsync_core::{Engine, EngineConfig, ItemCategory, LogEntry, Network};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Everything a network-bound command needs: the engine settings, the
/// seeded network, and output preferences.
pub struct Session {
    pub engine_config: EngineConfig,
    pub network: Network,
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl Session {
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = config::load_config(global)?;
        let engine_config = config.engine.to_engine_config()?;
        let network = config::load_network(global, &config)?;
        let format = config::output_format(global, &config);
        let color = output::should_color(config::color_mode(global, &config));
        Ok(Self {
            engine_config,
            network,
            format,
            color,
            quiet: global.quiet,
        })
    }

    /// Build an engine over the seeded network with `engine_config`.
    pub fn engine(&self, engine_config: EngineConfig) -> Result<Engine, CliError> {
        Ok(Engine::new(self.network.clone(), engine_config)?)
    }

    pub fn print(&self, rendered: &str) {
        output::print_output(rendered, self.quiet);
    }
}

/// Parse a supply category, listing the accepted slugs on failure.
pub fn parse_category(raw: &str) -> Result<ItemCategory, CliError> {
    raw.parse().map_err(|_| CliError::UnknownCategory {
        given: raw.to_owned(),
        expected: ItemCategory::all()
            .map(ItemCategory::slug)
            .collect::<Vec<_>>()
            .join(", "),
    })
}

// ── Shared log rendering ─────────────────────────────────────────────

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Facility")]
    facility: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Render log entries (most recent first) in the session's format.
pub fn render_log(session: &Session, entries: &[Arc<LogEntry>]) -> Result<String, CliError> {
    let color = session.color;
    output::render_list(session.format, entries, |e| LogRow {
        time: e.timestamp.format("%H:%M:%S").to_string(),
        severity: output::paint_severity(e.severity, color),
        facility: e.facility_name.clone(),
        message: e.message.clone(),
    })
}

/// One log entry as a single line, for live streaming.
pub fn log_line(entry: &LogEntry, color: bool) -> String {
    format!(
        "[{}] {:<8} {}: {}",
        entry.timestamp.format("%H:%M:%S"),
        output::paint_severity(entry.severity, color),
        entry.facility_name,
        entry.message
    )
}

/// Dispatch a network-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session) -> Result<(), CliError> {
    match cmd {
        Command::Status(args) => status::handle(&args, session),
        Command::Census(args) => census::handle(&args, session),
        Command::Trend(args) => trend::handle(&args, session),
        Command::Simulate(args) => simulate::handle(&args, session).await,
        Command::Replay(args) => replay::handle(&args, session).await,
        Command::Brief => brief::handle(session),
        // Config and Completions are handled before a session is loaded
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "config and completions do not take a network session".into(),
        }),
    }
}
