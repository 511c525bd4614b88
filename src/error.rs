// CPHAGG ERROR TAXONOMY
// CONFIGURATION AND LAUNCH ERRORS ARE FATAL. OUTPUT ANOMALIES NEVER LEAVE THE READER.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    // PRE-LAUNCH: NOTHING HAS BEEN STARTED
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    // A WORKER FAILED TO START. WORKERS BEFORE `index` ARE ALREADY RUNNING.
    #[error("failed to launch worker {index} ({program}): {source}")]
    LaunchFailure {
        index: usize,
        program: String,
        #[source]
        source: io::Error,
    },

    // A LINE MATCHED A PATTERN BUT A FIELD DID NOT PARSE
    #[error("malformed worker output: {field}={value:?}")]
    MalformedWorkerOutput { field: &'static str, value: String },

    #[error("invalid {name} pattern: {reason}")]
    InvalidPattern { name: &'static str, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, FleetError>;
