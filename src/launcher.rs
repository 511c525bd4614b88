// CPHAGG WORKER LAUNCHER
// STARTS ONE WORKER WITH STDOUT AND STDERR MERGED INTO A SINGLE PIPE.
//
// BOTH CHILD DESCRIPTORS ARE DUPLICATES OF ONE WRITE END, SO ORDERING BETWEEN
// THE TWO STREAMS IS PRESERVED AS THE WORKER WROTE IT. THE PARENT'S COPIES ARE
// DROPPED WITH THE Command, SO EOF ARRIVES WHEN THE WORKER (AND ANY CHILDREN
// IT HANDED THE PIPE TO) EXITS.

use std::fs::File;
use std::io;
use std::os::fd::{FromRawFd, OwnedFd};
use std::process::{Child, Command, ExitStatus, Stdio};

use crate::error::{FleetError, Result};

pub struct Worker {
    pub index: usize,
    pub pid: u32,
    pub threads: u32,
    child: Child,
    output: Option<File>,
}

impl Worker {
    // HAND THE OUTPUT STREAM TO A READER. SECOND CALL RETURNS NONE.
    pub fn take_output(&mut self) -> Option<File> {
        self.output.take()
    }

    pub fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait()
    }

    // GRACEFUL STOP REQUEST. A WORKER THAT ALREADY EXITED IS LEFT ALONE.
    pub fn interrupt(&mut self) -> bool {
        if let Ok(Some(_)) = self.child.try_wait() {
            return false;
        }
        unsafe { libc::kill(self.pid as libc::pid_t, libc::SIGINT) == 0 }
    }
}

pub fn launch_failure(index: usize, program: &str, source: io::Error) -> FleetError {
    FleetError::LaunchFailure {
        index,
        program: program.to_string(),
        source,
    }
}

fn merged_pipe() -> io::Result<(File, OwnedFd)> {
    let mut fds = [0 as libc::c_int; 2];
    if unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) } != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: pipe2 RETURNED TWO FRESH DESCRIPTORS THAT NOTHING ELSE OWNS
    let (read, write) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
    Ok((File::from(read), write))
}

pub fn launch_worker(argv: &[String], index: usize, threads: u32) -> Result<Worker> {
    let program = argv.first().cloned().unwrap_or_default();
    let fail = |source: io::Error| launch_failure(index, &program, source);

    if program.is_empty() {
        let source = io::Error::new(io::ErrorKind::InvalidInput, "empty worker command");
        return Err(fail(source));
    }

    let (output, write) = merged_pipe().map_err(fail)?;
    let write_err = write.try_clone().map_err(fail)?;

    let child = Command::new(&program)
        .args(&argv[1..])
        .stdout(Stdio::from(write))
        .stderr(Stdio::from(write_err))
        .spawn()
        .map_err(fail)?;

    let pid = child.id();
    tracing::info!(worker = index, pid, threads, "worker launched");

    Ok(Worker {
        index,
        pid,
        threads,
        child,
        output: Some(output),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn argv(s: &[&str]) -> Vec<String> {
        s.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn stdout_and_stderr_share_one_stream() {
        let script = argv(&["sh", "-c", "echo out; echo err 1>&2"]);
        let mut w = launch_worker(&script, 0, 1).unwrap();
        let mut text = String::new();
        w.take_output().unwrap().read_to_string(&mut text).unwrap();
        assert!(w.wait().unwrap().success());
        assert!(text.contains("out\n"));
        assert!(text.contains("err\n"));
    }

    #[test]
    fn output_taken_once() {
        let mut w = launch_worker(&argv(&["true"]), 0, 1).unwrap();
        assert!(w.take_output().is_some());
        assert!(w.take_output().is_none());
        w.wait().unwrap();
    }

    #[test]
    fn missing_binary_is_launch_failure() {
        let err = launch_worker(&argv(&["/nonexistent/cphagg-worker"]), 2, 1)
            .err()
            .unwrap();
        match err {
            FleetError::LaunchFailure { index, program, source } => {
                assert_eq!(index, 2);
                assert_eq!(program, "/nonexistent/cphagg-worker");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn interrupt_stops_a_sleeping_worker() {
        let mut w = launch_worker(&argv(&["sleep", "30"]), 0, 1).unwrap();
        assert!(w.interrupt());
        let status = w.wait().unwrap();
        assert!(!status.success());
        assert!(!w.interrupt());
    }
}
