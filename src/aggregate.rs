// CPHAGG AGGREGATION
// INTERVAL: SUM OF EVERY RECORD'S LATEST RATE, ON THE LAST PROCESS'S CADENCE.
// FINAL: REDUCTION OF EACH WORKER'S SUMMARY LINE INTO ONE JOB SUMMARY.
//
// THE INTERVAL SUM IS A BEST-EFFORT SNAPSHOT. OTHER PROCESSES CONTRIBUTE
// WHATEVER THEY LAST REPORTED, WHICH MAY BE FROM A DIFFERENT INSTANT.

use std::fmt;

use crate::distribute::Distribution;
use crate::record::Fleet;

// WHOLE SECONDS KEEP ONE DECIMAL (10 -> "10.0"). A FLEET THAT NEVER REPORTED
// POSITIVE SECONDS PRINTS A BARE "0".
fn seconds_field(seconds: f64) -> String {
    if seconds == 0.0 {
        "0".to_string()
    } else if seconds.fract() == 0.0 {
        format!("{:.1}", seconds)
    } else {
        format!("{}", seconds)
    }
}

const RULE: &str =
    "---------------------------------------------------------------------------------";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntervalReport {
    pub rate: f64,
    pub threads: u32,
    pub processes: u32,
}

impl fmt::Display for IntervalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rate={:.2},threads={},processes={}",
            self.rate, self.threads, self.processes
        )
    }
}

// SUMMED IN INDEX ORDER
pub fn interval_report(fleet: &Fleet) -> IntervalReport {
    let rate = fleet.records().iter().map(|r| r.latest_rate()).sum();
    IntervalReport {
        rate,
        threads: fleet.threads,
        processes: fleet.processes,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FleetSummary {
    pub distribution: Distribution,
    pub total_iterations: u64,
    pub max_seconds: f64,
    pub rate_accumulator: f64,
    // WORKERS THAT NEVER PRINTED A SUMMARY LINE
    pub missing: Vec<usize>,
    pub interrupted: bool,
}

impl FleetSummary {
    pub fn from_fleet(fleet: &Fleet, distribution: Distribution) -> Self {
        let mut total_iterations = 0u64;
        let mut max_seconds = 0.0f64;
        let mut rate_accumulator = 0.0f64;
        let mut missing = Vec::new();

        for record in fleet.records() {
            match record.summary() {
                Some(s) => {
                    total_iterations += s.total_iterations;
                    if s.total_seconds > max_seconds {
                        max_seconds = s.total_seconds;
                    }
                    rate_accumulator += s.avg_rate;
                }
                None => missing.push(record.index),
            }
        }

        Self {
            distribution,
            total_iterations,
            max_seconds,
            rate_accumulator,
            missing,
            interrupted: false,
        }
    }

    pub fn avg_rate_per_process(&self) -> f64 {
        self.rate_accumulator / self.distribution.processes as f64
    }

    pub fn final_line(&self) -> String {
        format!(
            "totalJobIterations={},maxSeconds={},avgJobRate={:.2},avgRatePerProcess={:.2}",
            self.total_iterations,
            seconds_field(self.max_seconds),
            self.rate_accumulator,
            self.avg_rate_per_process()
        )
    }

    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![
            RULE.to_string(),
            "--- Summary for all processes".to_string(),
            RULE.to_string(),
        ];
        lines.extend(self.distribution.breakdown());
        if !self.missing.is_empty() {
            let ids: Vec<String> = self.missing.iter().map(|i| (i + 1).to_string()).collect();
            lines.push(format!("--- No summary reported by processes: {}", ids.join(", ")));
        }
        if self.interrupted {
            lines.push("--- Run was interrupted".to_string());
        }
        lines.push(RULE.to_string());
        lines.push(self.final_line());
        lines
    }
}
