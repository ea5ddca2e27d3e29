//! Analysis brief handler. The brief is JSON in every output mode.

use medsync_core::NetworkBrief;

use crate::cli::OutputFormat;
use crate::commands::Session;
use crate::error::CliError;
use crate::output;

pub fn handle(session: &Session) -> Result<(), CliError> {
    let brief = NetworkBrief::from_network(&session.network);
    let compact = session.format == OutputFormat::JsonCompact;
    session.print(&output::render_json(&brief, compact)?);
    Ok(())
}
