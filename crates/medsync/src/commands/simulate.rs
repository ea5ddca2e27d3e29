//! Live simulator handler: streams the activity log while the consumption
//! simulator depletes stock, then prints the final log.

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use medsync_core::{EngineConfig, OperatingContext};

use crate::cli::{OutputFormat, SimulateArgs};
use crate::commands::{self, Session};
use crate::error::CliError;

pub async fn handle(args: &SimulateArgs, session: &Session) -> Result<(), CliError> {
    let engine_config = EngineConfig {
        rng_seed: args.rng_seed.or(session.engine_config.rng_seed),
        initial_context: OperatingContext::Oversight,
        ..session.engine_config.clone()
    };
    let engine = session.engine(engine_config)?;
    let mut feed = engine.subscribe_log();
    engine.start()?;

    let stream = session.format == OutputFormat::Table && !session.quiet;
    let deadline = tokio::time::sleep(*args.duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            biased;
            () = &mut deadline => break,
            received = feed.recv() => match received {
                Ok(entry) => {
                    if stream {
                        println!("{}", commands::log_line(&entry, session.color));
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "log stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    engine.shutdown().await;
    debug!(pending = engine.pending_count(), "simulation finished");

    if stream {
        println!();
    }
    let out = commands::render_log(session, &engine.log_entries())?;
    session.print(&out);
    Ok(())
}
