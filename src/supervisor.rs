// CPHAGG FLEET SUPERVISOR
// IDLE -> LAUNCHING -> RUNNING -> DRAINING -> SUMMARIZED
//
// LAUNCH ALL WORKERS, ONE READER THREAD EACH, THEN BLOCK UNTIL EVERY WORKER
// EXITS. THE INTERRUPT FLAG IS ADVISORY: IT NEVER STOPS THE WAIT. WORKERS END
// ON THEIR OWN (DURATION, ITERATION COUNT, FAULT, OR THE SIGINT THEY RECEIVE
// FROM THE TERMINAL) AND THE SUMMARY STILL PRINTS.

use std::io::{self, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::aggregate::FleetSummary;
use crate::classify::Classifier;
use crate::config::FleetConfig;
use crate::error::{FleetError, Result};
use crate::launcher::{launch_failure, launch_worker, Worker};
use crate::logging::Console;
use crate::reader::{read_worker_output, ReaderContext, ReaderStats};
use crate::record::Fleet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Launching,
    Running,
    Draining,
    Summarized,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub summary: FleetSummary,
    // NONE: KILLED BY A SIGNAL OR NOT AWAITABLE
    pub exit_codes: Vec<Option<i32>>,
    pub reader_stats: Vec<ReaderStats>,
    pub interrupted: bool,
}

pub struct Supervisor {
    config: FleetConfig,
    console: Arc<Console>,
    phase: Phase,
}

// A READER THAT CANNOT START IS A LAUNCH FAILURE OF ITS WORKER
fn spawn_reader(
    worker: &mut Worker,
    program: &str,
    fleet: &Arc<Fleet>,
    classifier: &Arc<Classifier>,
    console: &Arc<Console>,
    verbosity: u8,
) -> Result<JoinHandle<ReaderStats>> {
    let output = worker.take_output().ok_or_else(|| {
        let source = io::Error::new(io::ErrorKind::BrokenPipe, "worker output already taken");
        launch_failure(worker.index, program, source)
    })?;
    let index = worker.index;
    let pid = worker.pid;
    let fleet = Arc::clone(fleet);
    let classifier = Arc::clone(classifier);
    let console = Arc::clone(console);

    let handle = std::thread::Builder::new()
        .name(format!("reader-{}", index))
        .spawn(move || {
            let ctx = ReaderContext {
                index,
                pid,
                verbosity,
                fleet: &fleet,
                classifier: &classifier,
                console: &console,
            };
            read_worker_output(BufReader::new(output), &ctx)
        })
        .map_err(|source| launch_failure(index, program, source))?;
    Ok(handle)
}

impl Supervisor {
    pub fn new(config: FleetConfig, console: Arc<Console>) -> Self {
        Self {
            config,
            console,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "supervisor phase");
        self.phase = phase;
    }

    pub fn run(&mut self, interrupted: &AtomicBool) -> Result<RunOutcome> {
        self.run_with(interrupted, launch_worker)
    }

    // `launch` STARTS ONE WORKER FROM (ARGV, INDEX, THREADS)
    pub fn run_with<L>(&mut self, interrupted: &AtomicBool, mut launch: L) -> Result<RunOutcome>
    where
        L: FnMut(&[String], usize, u32) -> Result<Worker>,
    {
        // IDLE: NOTHING STARTS UNLESS THE WHOLE CONFIGURATION IS SOUND
        let (dist, template, classifier) = self.config.validate()?;
        let fleet = Arc::new(Fleet::new(&dist));
        let classifier = Arc::new(classifier);
        let verbosity = self.config.verbosity;

        self.enter(Phase::Launching);
        let mut workers: Vec<Worker> = Vec::with_capacity(fleet.len());
        let mut readers: Vec<JoinHandle<ReaderStats>> = Vec::with_capacity(fleet.len());
        let mut launch_error: Option<FleetError> = None;

        for index in 0..fleet.len() {
            let threads = fleet.record(index).threads;
            let argv = template.for_worker(index, threads);
            let mut worker = match launch(&argv, index, threads) {
                Ok(w) => w,
                Err(e) => {
                    launch_error = Some(e);
                    break;
                }
            };
            let spawned = spawn_reader(
                &mut worker,
                template.program(),
                &fleet,
                &classifier,
                &self.console,
                verbosity,
            );
            match spawned {
                Ok(handle) => readers.push(handle),
                Err(e) => {
                    // STILL AWAITED BELOW; NOBODY DRAINS ITS PIPE, SO ASK IT TO STOP
                    worker.interrupt();
                    launch_error = Some(e);
                }
            }
            workers.push(worker);
            if launch_error.is_some() {
                break;
            }
        }

        if let Some(e) = launch_error.take() {
            if workers.is_empty() {
                self.enter(Phase::Summarized);
                return Err(e);
            }
            tracing::error!(
                started = workers.len(),
                "{}; stopping workers already started",
                e
            );
            for w in workers.iter_mut() {
                w.interrupt();
            }
            launch_error = Some(e);
            self.enter(Phase::Draining);
        } else {
            self.enter(Phase::Running);
        }

        let mut exit_codes = Vec::with_capacity(workers.len());
        for w in workers.iter_mut() {
            match w.wait() {
                Ok(status) => {
                    if !status.success() {
                        tracing::warn!(
                            worker = w.index,
                            pid = w.pid,
                            %status,
                            "worker exited abnormally"
                        );
                    }
                    exit_codes.push(status.code());
                }
                Err(e) => {
                    tracing::warn!(worker = w.index, pid = w.pid, error = %e, "worker wait failed");
                    exit_codes.push(None);
                }
            }
        }

        if self.phase == Phase::Running {
            self.enter(Phase::Draining);
        }

        // EVERY STREAM CLOSED BEFORE THE REDUCTION: NO RECORD CHANGES AFTER THIS
        let mut reader_stats = Vec::with_capacity(readers.len());
        for (index, handle) in readers.into_iter().enumerate() {
            match handle.join() {
                Ok(stats) => reader_stats.push(stats),
                Err(_) => {
                    tracing::error!(worker = index, "reader thread panicked");
                    reader_stats.push(ReaderStats::default());
                }
            }
        }

        let was_interrupted = interrupted.load(Ordering::Relaxed);
        if was_interrupted {
            tracing::info!("interrupt received during run; all workers have now exited");
        }

        let mut summary = FleetSummary::from_fleet(&fleet, dist);
        summary.interrupted = was_interrupted;
        for line in summary.render() {
            self.console.line(line);
        }
        self.enter(Phase::Summarized);

        if let Some(e) = launch_error {
            return Err(e);
        }

        Ok(RunOutcome {
            summary,
            exit_codes,
            reader_stats,
            interrupted: was_interrupted,
        })
    }
}
