// CPHAGG FLEET CONFIGURATION
// IMMUTABLE ONCE THE SUPERVISOR ACCEPTS IT.

use crate::classify::Classifier;
use crate::command::CommandTemplate;
use crate::distribute::Distribution;
use crate::error::{FleetError, Result};

pub const DEFAULT_THREAD_FLAG: &str = "-nt";
pub const DEFAULT_ID_FLAG: &str = "-id";
pub const DEFAULT_FLAG_PLACEHOLDER: &str = "0";

// VERBOSITY LEVELS
// 0: MINIMAL. 1: PREFIX WORKER LINES WITH PID. 2: ALSO ECHO EVERY INTERVAL SAMPLE.
pub const VERBOSE_PIDS: u8 = 1;
pub const VERBOSE_SAMPLES: u8 = 2;

#[derive(Clone, Debug)]
pub struct FleetConfig {
    pub command: String,
    pub threads: u32,
    pub processes: u32,
    pub verbosity: u8,
    pub thread_flag: String,
    pub id_flag: String,
    pub flag_placeholder: String,
    pub interval_pattern: Option<String>,
    pub summary_pattern: Option<String>,
}

impl FleetConfig {
    pub fn new(command: impl Into<String>, threads: u32, processes: u32) -> Self {
        Self {
            command: command.into(),
            threads,
            processes,
            verbosity: 0,
            thread_flag: DEFAULT_THREAD_FLAG.to_string(),
            id_flag: DEFAULT_ID_FLAG.to_string(),
            flag_placeholder: DEFAULT_FLAG_PLACEHOLDER.to_string(),
            interval_pattern: None,
            summary_pattern: None,
        }
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_flags(
        mut self,
        thread_flag: impl Into<String>,
        id_flag: impl Into<String>,
    ) -> Self {
        self.thread_flag = thread_flag.into();
        self.id_flag = id_flag.into();
        self
    }

    pub fn with_patterns(mut self, interval: Option<String>, summary: Option<String>) -> Self {
        self.interval_pattern = interval;
        self.summary_pattern = summary;
        self
    }

    pub fn distribution(&self) -> Result<Distribution> {
        if self.threads == 0 {
            return Err(FleetError::InvalidConfiguration(
                "number of threads must be at least 1".to_string(),
            ));
        }
        Distribution::plan(self.threads, self.processes)
    }

    pub fn template(&self) -> Result<CommandTemplate> {
        if self.thread_flag.is_empty() || self.id_flag.is_empty() {
            return Err(FleetError::InvalidConfiguration(
                "thread and id flag names must not be empty".to_string(),
            ));
        }
        if self.thread_flag == self.id_flag {
            return Err(FleetError::InvalidConfiguration(format!(
                "thread and id flags must differ (both {})",
                self.thread_flag
            )));
        }
        CommandTemplate::parse(
            &self.command,
            &self.thread_flag,
            &self.id_flag,
            &self.flag_placeholder,
        )
    }

    pub fn classifier(&self) -> Result<Classifier> {
        Classifier::with_patterns(self.interval_pattern.as_deref(), self.summary_pattern.as_deref())
    }

    // EVERYTHING A RUN NEEDS, CHECKED BEFORE ANY WORKER STARTS
    pub fn validate(&self) -> Result<(Distribution, CommandTemplate, Classifier)> {
        Ok((self.distribution()?, self.template()?, self.classifier()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = FleetConfig::new("cph -d 10", 10, 3);
        assert_eq!(c.thread_flag, "-nt");
        assert_eq!(c.id_flag, "-id");
        assert_eq!(c.flag_placeholder, "0");
        assert_eq!(c.verbosity, 0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn more_processes_than_threads() {
        let err = FleetConfig::new("cph", 4, 5).validate().unwrap_err();
        assert!(matches!(err, FleetError::InvalidConfiguration(_)));
    }

    #[test]
    fn zero_threads() {
        assert!(FleetConfig::new("cph", 0, 0).validate().is_err());
    }

    #[test]
    fn identical_flags_rejected() {
        let c = FleetConfig::new("cph", 4, 2).with_flags("-x", "-x");
        assert!(matches!(c.validate(), Err(FleetError::InvalidConfiguration(_))));
    }

    #[test]
    fn bad_pattern_rejected() {
        let c = FleetConfig::new("cph", 4, 2).with_patterns(Some("no groups".to_string()), None);
        assert!(matches!(c.validate(), Err(FleetError::InvalidPattern { .. })));
    }
}
