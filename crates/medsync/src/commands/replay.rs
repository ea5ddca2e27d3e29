//! Script replay handler.
//!
//! A script is a JSON array of steps. Each step is either an engine
//! command (`{"command": {"type": "record_stock", ...}}`) or a pause
//! (`{"wait_ms": 1600}`) that lets background tasks such as the offline
//! settle timer fire.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use medsync_core::{Command, CommandResult, LogEntry};

use crate::cli::{OutputFormat, ReplayArgs};
use crate::commands::{self, Session};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Command { command: Command },
    Wait { wait_ms: u64 },
}

/// Outcome of a replayed script.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub results: Vec<CommandResult>,
    pub pending: usize,
    pub log: Vec<Arc<LogEntry>>,
}

pub fn parse_script(raw: &str) -> Result<Vec<Step>, CliError> {
    serde_json::from_str(raw).map_err(CliError::Script)
}

fn read_script(path: &Path) -> Result<Vec<Step>, CliError> {
    let raw = std::fs::read_to_string(path)?;
    parse_script(&raw)
}

pub async fn handle(args: &ReplayArgs, session: &Session) -> Result<(), CliError> {
    let steps = read_script(&args.script)?;
    let engine = session.engine(session.engine_config.clone())?;
    engine.start()?;

    let mut results = Vec::new();
    for step in steps {
        match step {
            Step::Command { command } => {
                debug!(?command, "replay step");
                results.push(engine.execute(command));
            }
            Step::Wait { wait_ms } => tokio::time::sleep(Duration::from_millis(wait_ms)).await,
        }
    }

    let report = ReplayReport {
        results,
        pending: engine.pending_count(),
        log: engine.log_entries(),
    };
    engine.shutdown().await;

    let out = match session.format {
        OutputFormat::Table => format!(
            "{}\n\nPending offline mutations: {}",
            commands::render_log(session, &report.log)?,
            report.pending
        ),
        OutputFormat::Json => output::render_json(&report, false)?,
        OutputFormat::JsonCompact => output::render_json(&report, true)?,
    };
    session.print(&out);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use medsync_core::EntityId;

    #[test]
    fn parses_commands_and_waits() {
        let steps = parse_script(
            r#"[
                {"command": {"type": "set_connectivity", "online": false}},
                {"command": {"type": "record_stock", "facility_id": "h1",
                             "department_id": "d1", "item_id": "i2", "delta": -3}},
                {"wait_ms": 1600}
            ]"#,
        )
        .unwrap();

        assert_eq!(steps.len(), 3);
        assert_eq!(
            steps[1],
            Step::Command {
                command: Command::RecordStock {
                    facility_id: EntityId::from("h1"),
                    department_id: EntityId::from("d1"),
                    item_id: EntityId::from("i2"),
                    delta: -3,
                }
            }
        );
        assert_eq!(steps[2], Step::Wait { wait_ms: 1600 });
    }

    #[test]
    fn rejects_unknown_step() {
        let err = parse_script(r#"[{"command": {"type": "reboot"}}]"#).unwrap_err();
        assert!(matches!(err, CliError::Script(_)));
    }
}
