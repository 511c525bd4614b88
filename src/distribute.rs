// CPHAGG THREAD DISTRIBUTOR
// SPREADS T THREADS OVER N PROCESSES. PURE, NO I/O.
//
// LOW = T / N, REMAINDER = T % N, HIGH = LOW + 1.
// THE LAST `REMAINDER` PROCESSES (BY INDEX) RUN HIGH, THE REST RUN LOW.
// SUM IS EXACTLY T, IMBALANCE IS AT MOST ONE THREAD.

use crate::error::{FleetError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Distribution {
    pub threads: u32,
    pub processes: u32,
    pub low: u32,
    pub high: u32,
    pub remainder: u32,
}

impl Distribution {
    pub fn plan(threads: u32, processes: u32) -> Result<Self> {
        if processes == 0 {
            return Err(FleetError::InvalidConfiguration(
                "number of processes must be at least 1".to_string(),
            ));
        }
        if processes > threads {
            return Err(FleetError::InvalidConfiguration(format!(
                "number of threads ({}) must be at least the number of processes ({})",
                threads, processes
            )));
        }

        let low = threads / processes;
        Ok(Self {
            threads,
            processes,
            low,
            high: low + 1,
            remainder: threads % processes,
        })
    }

    // INDEX OF THE FIRST PROCESS RUNNING HIGH (== processes WHEN REMAINDER IS 0)
    pub fn first_high(&self) -> u32 {
        self.processes - self.remainder
    }

    pub fn threads_for(&self, index: u32) -> u32 {
        if index >= self.first_high() {
            self.high
        } else {
            self.low
        }
    }

    pub fn per_process(&self) -> Vec<u32> {
        (0..self.processes).map(|i| self.threads_for(i)).collect()
    }

    // BREAKDOWN LINES (1-BASED PROCESS NUMBERS)
    pub fn breakdown(&self) -> Vec<String> {
        // REMAINDER < PROCESSES, SO THE LOW RANGE IS NEVER EMPTY
        let mut lines = vec![
            format!(
                "--- Thread distribution (threads={}  processes={})",
                self.threads, self.processes
            ),
            format!(
                "--- Processes 1 to {} running {} threads",
                self.first_high(),
                self.low
            ),
        ];
        if self.remainder > 0 {
            lines.push(format!(
                "--- Processes {} to {}  (total: {})  running {} threads",
                self.first_high() + 1,
                self.processes,
                self.remainder,
                self.high
            ));
        }
        lines
    }
}
