use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};

use cphagg::logging::Console;
use cphagg::{FleetConfig, Supervisor};

pub fn run_fleet(config: FleetConfig, interrupted: &AtomicBool) -> Result<()> {
    println!("{}", config.command);

    let console = Arc::new(Console::stdout());
    let mut supervisor = Supervisor::new(config, console);
    let outcome = supervisor.run(interrupted).context("fleet run failed")?;

    let failed = outcome.exit_codes.iter().filter(|c| **c != Some(0)).count();
    if failed > 0 {
        tracing::warn!(failed, "some workers did not exit cleanly");
    }
    Ok(())
}
