// CPHAGG LIBRARY
// SPREADS A THREAD BUDGET OVER A FLEET OF WORKER PROCESSES, CLASSIFIES THEIR
// OUTPUT, AND AGGREGATES PER-PROCESS RATES INTO ONE FLEET-WIDE FIGURE.

pub mod aggregate;
pub mod classify;
pub mod command;
pub mod config;
pub mod distribute;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod reader;
pub mod record;
pub mod supervisor;

pub use config::FleetConfig;
pub use error::{FleetError, Result};
pub use supervisor::{RunOutcome, Supervisor};
