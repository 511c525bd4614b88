// CPHAGG PER-PROCESS READER
// ONE THREAD PER WORKER FOR THE WORKER'S WHOLE LIFETIME.
// THE ONLY BLOCKING CALL IS THE LINE READ. EOF ENDS THE LOOP.
//
// INTERVAL: STORE LATEST RATE, THEN (LAST PROCESS ONLY) PRINT THE FLEET AGGREGATE.
// SUMMARY:  STORE THE THREE TOTALS, ECHO THE LINE.
// OTHER:    ECHO THE LINE.

use std::io::BufRead;

use crate::aggregate::interval_report;
use crate::classify::{Classifier, LineKind};
use crate::config::{VERBOSE_PIDS, VERBOSE_SAMPLES};
use crate::logging::Console;
use crate::record::Fleet;

pub struct ReaderContext<'a> {
    pub index: usize,
    pub pid: u32,
    pub verbosity: u8,
    pub fleet: &'a Fleet,
    pub classifier: &'a Classifier,
    pub console: &'a Console,
}

impl ReaderContext<'_> {
    fn is_last(&self) -> bool {
        self.index + 1 == self.fleet.len()
    }

    fn prefix(&self) -> String {
        if self.verbosity >= VERBOSE_PIDS {
            format!("pid:{} ", self.pid)
        } else {
            String::new()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub intervals: u64,
    pub summaries: u64,
    pub passthrough: u64,
    pub malformed: u64,
    pub aggregates: u64,
}

pub fn read_worker_output<R: BufRead>(mut source: R, ctx: &ReaderContext<'_>) -> ReaderStats {
    let record = ctx.fleet.record(ctx.index);
    let prefix = ctx.prefix();
    let last = ctx.is_last();
    let mut stats = ReaderStats::default();
    let mut raw = Vec::new();

    loop {
        raw.clear();
        match source.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(worker = ctx.index, error = %e, "worker output read failed");
                break;
            }
        }
        let decoded = String::from_utf8_lossy(&raw);
        let line = decoded.trim();

        let kind = match ctx.classifier.try_classify(line) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!(worker = ctx.index, "{}; treating line as passthrough", e);
                stats.malformed += 1;
                LineKind::Passthrough
            }
        };

        match kind {
            LineKind::IntervalSample { rate, .. } => {
                stats.intervals += 1;
                record.set_latest_rate(rate);
                if last {
                    stats.aggregates += 1;
                    ctx.console.line(interval_report(ctx.fleet));
                }
                if ctx.verbosity >= VERBOSE_SAMPLES {
                    ctx.console.line(format_args!("{}{}", prefix, line));
                }
            }
            LineKind::FinalSummary(summary) => {
                stats.summaries += 1;
                record.set_summary(summary);
                ctx.console.line(format_args!("{}{}", prefix, line));
            }
            LineKind::Passthrough => {
                stats.passthrough += 1;
                ctx.console.line(format_args!("{}{}", prefix, line));
            }
        }
    }

    tracing::debug!(worker = ctx.index, ?stats, "worker output closed");
    stats
}
