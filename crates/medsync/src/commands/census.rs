//! Network census handler.

use tabled::Tabled;

use medsync_core::{CensusTotal, network_census, network_census_series};

use crate::cli::CensusArgs;
use crate::commands::Session;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct CensusRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Patients")]
    total: u64,
}

pub fn handle(args: &CensusArgs, session: &Session) -> Result<(), CliError> {
    let totals: Vec<CensusTotal> = if args.sorted {
        network_census_series(&session.network)
    } else {
        network_census(&session.network)
            .into_iter()
            .map(|(date, total)| CensusTotal { date, total })
            .collect()
    };

    let out = output::render_list(session.format, &totals, |t| CensusRow {
        date: t.date.to_string(),
        total: t.total,
    })?;
    session.print(&out);
    Ok(())
}
