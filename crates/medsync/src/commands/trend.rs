//! Category trend handler.

use tabled::Tabled;

use medsync_core::network_category_history;

use crate::cli::TrendArgs;
use crate::commands::{self, Session};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Time")]
    timestamp: String,
    #[tabled(rename = "Network total")]
    value: u32,
    #[tabled(rename = "Kind")]
    kind: String,
}

pub fn handle(args: &TrendArgs, session: &Session) -> Result<(), CliError> {
    let category = commands::parse_category(&args.category)?;

    let series = network_category_history(&session.network, category);
    let out = output::render_list(session.format, &series, |p| TrendRow {
        timestamp: p.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        value: p.value,
        kind: p.kind.to_string(),
    })?;
    session.print(&out);
    Ok(())
}
