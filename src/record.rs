// CPHAGG PROCESS RECORDS
// ONE RECORD PER WORKER, SYNCHRONIZED PER RECORD. NO FLEET-WIDE LOCK.
//
// EACH RECORD HAS EXACTLY ONE WRITER: ITS OWN READER THREAD.
// THE AGGREGATOR AND SUPERVISOR ONLY READ.
// THE FLEET IS BUILT ONCE AND NEVER RESIZED, SO INDEXING NEEDS NO LOCK.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::classify::WorkerSummary;
use crate::distribute::Distribution;

pub struct ProcessRecord {
    pub index: usize,
    pub threads: u32,
    // f64 BITS. RELEASE ON STORE, ACQUIRE ON LOAD.
    latest_rate: AtomicU64,
    summary: Mutex<Option<WorkerSummary>>,
}

impl ProcessRecord {
    pub fn new(index: usize, threads: u32) -> Self {
        Self {
            index,
            threads,
            latest_rate: AtomicU64::new(0f64.to_bits()),
            summary: Mutex::new(None),
        }
    }

    pub fn set_latest_rate(&self, rate: f64) {
        self.latest_rate.store(rate.to_bits(), Ordering::Release);
    }

    pub fn latest_rate(&self) -> f64 {
        f64::from_bits(self.latest_rate.load(Ordering::Acquire))
    }

    pub fn set_summary(&self, summary: WorkerSummary) {
        // A POISONED LOCK STILL HOLDS A PLAIN Copy VALUE; KEEP GOING
        let mut slot = self.summary.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(summary);
    }

    pub fn summary(&self) -> Option<WorkerSummary> {
        *self.summary.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct Fleet {
    pub threads: u32,
    pub processes: u32,
    records: Vec<ProcessRecord>,
}

impl Fleet {
    pub fn new(dist: &Distribution) -> Self {
        let records = (0..dist.processes)
            .map(|i| ProcessRecord::new(i as usize, dist.threads_for(i)))
            .collect();
        Self {
            threads: dist.threads,
            processes: dist.processes,
            records,
        }
    }

    pub fn record(&self, index: usize) -> &ProcessRecord {
        &self.records[index]
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn fleet_mirrors_distribution() {
        let fleet = Fleet::new(&Distribution::plan(10, 3).unwrap());
        assert_eq!(fleet.len(), 3);
        let threads: Vec<u32> = fleet.records().iter().map(|r| r.threads).collect();
        assert_eq!(threads, vec![3, 3, 4]);
        assert_eq!(fleet.record(2).index, 2);
    }

    #[test]
    fn fresh_record_is_zero() {
        let r = ProcessRecord::new(0, 1);
        assert_eq!(r.latest_rate(), 0.0);
        assert!(r.summary().is_none());
    }

    #[test]
    fn rate_roundtrips_exactly() {
        let r = ProcessRecord::new(0, 1);
        r.set_latest_rate(1234.5678);
        assert_eq!(r.latest_rate(), 1234.5678);
    }

    #[test]
    fn later_summary_wins() {
        let r = ProcessRecord::new(0, 1);
        r.set_summary(WorkerSummary { total_iterations: 1, total_seconds: 1.0, avg_rate: 1.0 });
        r.set_summary(WorkerSummary { total_iterations: 2, total_seconds: 2.0, avg_rate: 2.0 });
        assert_eq!(r.summary().unwrap().total_iterations, 2);
    }

    #[test]
    fn concurrent_writers_touch_only_their_record() {
        let fleet = Arc::new(Fleet::new(&Distribution::plan(8, 8).unwrap()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let fleet = Arc::clone(&fleet);
                std::thread::spawn(move || {
                    for n in 0..1000 {
                        fleet.record(i).set_latest_rate((i * 1000 + n) as f64);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..8 {
            assert_eq!(fleet.record(i).latest_rate(), (i * 1000 + 999) as f64);
        }
    }
}
