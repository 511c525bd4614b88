// CPHAGG OUTPUT AND DIAGNOSTICS
//
// TWO CHANNELS:
//   CONSOLE: THE OPERATOR REPORT (WORKER LINES, INTERVAL RATES, SUMMARY). STDOUT.
//   TRACING: DIAGNOSTICS (LAUNCHES, PHASES, MALFORMED LINES). STDERR, RUST_LOG.

use std::fmt::Display;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A SECOND INIT (E.G. EMBEDDED USE) IS NOT AN ERROR
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

// LINE-ATOMIC SINK SHARED BY EVERY READER THREAD.
// ONE LOCK PER LINE: LINES FROM DIFFERENT WORKERS NEVER INTERLEAVE.
pub struct Console {
    out: Mutex<Box<dyn Write + Send>>,
}

impl Console {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn line(&self, text: impl Display) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        // A CLOSED STDOUT MUST NOT TAKE DOWN A READER MID-STREAM
        if writeln!(out, "{}", text).and_then(|_| out.flush()).is_err() {
            tracing::debug!("console write failed");
        }
    }
}

// IN-MEMORY CONSOLE TARGET. CLONES SHARE ONE BUFFER.
#[derive(Clone, Default)]
pub struct CaptureBuffer {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap_or_else(|e| e.into_inner()).extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
