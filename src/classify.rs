// CPHAGG OUTPUT CLASSIFIER
// ONE LINE IN, ONE OF THREE SHAPES OUT. INTERVAL IS TRIED FIRST, THEN SUMMARY.
//
// WORKER LINES LOOK LIKE:
//   id=2,rate=1234.50,threads=4
//   totalIterations=12345,totalSeconds=10.01,avgRate=1233.27

use std::str::FromStr;

use regex::{Captures, Regex};

use crate::error::{FleetError, Result};

pub const DEFAULT_INTERVAL_PATTERN: &str = r"id=(?P<id>\d+).+rate=(?P<rate>\d+(?:\.\d+)?)";
pub const DEFAULT_SUMMARY_PATTERN: &str = concat!(
    r"totalIterations=(?P<iterations>\d+)",
    r".+totalSeconds=(?P<seconds>\d+(?:\.\d+)?)",
    r".+avgRate=(?P<rate>\d+(?:\.\d+)?)"
);

const INTERVAL_GROUPS: &[&str] = &["id", "rate"];
const SUMMARY_GROUPS: &[&str] = &["iterations", "seconds", "rate"];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkerSummary {
    pub total_iterations: u64,
    pub total_seconds: f64,
    pub avg_rate: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LineKind {
    IntervalSample { worker_id: u32, rate: f64 },
    FinalSummary(WorkerSummary),
    Passthrough,
}

#[derive(Debug)]
pub struct Classifier {
    interval: Regex,
    summary: Regex,
}

fn compile(name: &'static str, pattern: &str, groups: &[&str]) -> Result<Regex> {
    let re = Regex::new(pattern).map_err(|e| FleetError::InvalidPattern {
        name,
        reason: e.to_string(),
    })?;
    let names: Vec<&str> = re.capture_names().flatten().collect();
    for group in groups {
        if !names.contains(group) {
            return Err(FleetError::InvalidPattern {
                name,
                reason: format!("missing named group (?P<{}>...)", group),
            });
        }
    }
    Ok(re)
}

fn field<T: FromStr>(caps: &Captures, name: &'static str) -> Result<T> {
    let raw = caps.name(name).map(|m| m.as_str()).unwrap_or("");
    raw.parse().map_err(|_| FleetError::MalformedWorkerOutput {
        field: name,
        value: raw.to_string(),
    })
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            interval: Regex::new(DEFAULT_INTERVAL_PATTERN).expect("default interval pattern"),
            summary: Regex::new(DEFAULT_SUMMARY_PATTERN).expect("default summary pattern"),
        }
    }

    // NONE KEEPS THE DEFAULT FOR THAT SHAPE
    pub fn with_patterns(interval: Option<&str>, summary: Option<&str>) -> Result<Self> {
        let interval = interval.unwrap_or(DEFAULT_INTERVAL_PATTERN);
        let summary = summary.unwrap_or(DEFAULT_SUMMARY_PATTERN);
        Ok(Self {
            interval: compile("interval", interval, INTERVAL_GROUPS)?,
            summary: compile("summary", summary, SUMMARY_GROUPS)?,
        })
    }

    // ERR ONLY WHEN A PATTERN MATCHED BUT ONE OF ITS FIELDS DID NOT PARSE.
    // A MALFORMED INTERVAL LINE IS NOT RETRIED AGAINST THE SUMMARY PATTERN.
    pub fn try_classify(&self, line: &str) -> Result<LineKind> {
        if let Some(caps) = self.interval.captures(line) {
            return Ok(LineKind::IntervalSample {
                worker_id: field(&caps, "id")?,
                rate: field(&caps, "rate")?,
            });
        }
        if let Some(caps) = self.summary.captures(line) {
            return Ok(LineKind::FinalSummary(WorkerSummary {
                total_iterations: field(&caps, "iterations")?,
                total_seconds: field(&caps, "seconds")?,
                avg_rate: field(&caps, "rate")?,
            }));
        }
        Ok(LineKind::Passthrough)
    }

    pub fn classify(&self, line: &str) -> LineKind {
        self.try_classify(line).unwrap_or(LineKind::Passthrough)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_line() {
        let c = Classifier::new();
        assert_eq!(
            c.classify("id=2,rate=1234.50,threads=4"),
            LineKind::IntervalSample { worker_id: 2, rate: 1234.5 }
        );
    }

    #[test]
    fn interval_with_log_prefix() {
        let c = Classifier::new();
        let line = "2026-10-17 10:00:01 [cph] id=0,rate=99.00,threads=1";
        assert_eq!(c.classify(line), LineKind::IntervalSample { worker_id: 0, rate: 99.0 });
    }

    #[test]
    fn integer_rate_accepted() {
        let c = Classifier::new();
        assert_eq!(
            c.classify("id=1,rate=42"),
            LineKind::IntervalSample { worker_id: 1, rate: 42.0 }
        );
    }

    #[test]
    fn summary_line() {
        let c = Classifier::new();
        assert_eq!(
            c.classify("totalIterations=12345,totalSeconds=10.01,avgRate=1233.27"),
            LineKind::FinalSummary(WorkerSummary {
                total_iterations: 12345,
                total_seconds: 10.01,
                avg_rate: 1233.27,
            })
        );
    }

    #[test]
    fn unrelated_line_passes_through() {
        let c = Classifier::new();
        assert_eq!(c.classify("controlThread START"), LineKind::Passthrough);
        assert_eq!(c.classify(""), LineKind::Passthrough);
        // ADJACENT FIELDS: THE PATTERN NEEDS AT LEAST ONE SEPARATOR CHARACTER
        assert_eq!(c.classify("id=1rate=2.0"), LineKind::Passthrough);
    }

    #[test]
    fn overflowing_id_is_malformed() {
        let c = Classifier::new();
        let line = "id=99999999999999999999,rate=1.00";
        assert!(matches!(
            c.try_classify(line),
            Err(FleetError::MalformedWorkerOutput { field: "id", .. })
        ));
        assert_eq!(c.classify(line), LineKind::Passthrough);
    }

    #[test]
    fn custom_pattern_needs_groups() {
        let err = Classifier::with_patterns(Some(r"rate=(\d+)"), None).err().unwrap();
        assert!(matches!(err, FleetError::InvalidPattern { name: "interval", .. }));
    }

    #[test]
    fn custom_pattern_used() {
        let pattern = r"worker (?P<id>\d+) did (?P<rate>[\d.]+)/s";
        let c = Classifier::with_patterns(Some(pattern), None).unwrap();
        assert_eq!(
            c.classify("worker 3 did 7.5/s"),
            LineKind::IntervalSample { worker_id: 3, rate: 7.5 }
        );
    }

    #[test]
    fn bad_regex_rejected() {
        assert!(Classifier::with_patterns(None, Some("(unclosed")).is_err());
    }
}
