//! The isolated capture worker: one job per process.
//!
//! Reads a single `WorkerRequest` JSON line from stdin, runs the capture
//! pipeline, writes protocol frames to stdout, and always exits. stdout
//! is reserved for frames; diagnostics go to stderr.

use std::io::{self, BufRead, Write};
use std::sync::Mutex;

use capture_logging::{capture_error, LogDestination};
use sitegrab_core::{Severity, WorkerEvent, WorkerRequest};
use sitegrab_engine::{run_capture, EventSink, FetchSettings, ReqwestSiteFetcher};

/// Serializes each event as one JSON line on stdout, flushed so the
/// supervisor sees frames as they happen.
struct StdoutEventSink {
    out: Mutex<io::Stdout>,
}

impl StdoutEventSink {
    fn new() -> Self {
        Self {
            out: Mutex::new(io::stdout()),
        }
    }
}

impl EventSink for StdoutEventSink {
    fn emit(&self, event: WorkerEvent) {
        let Ok(line) = serde_json::to_string(&event) else {
            return;
        };
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{line}");
            let _ = out.flush();
        }
    }
}

fn read_request() -> Result<WorkerRequest, String> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|err| format!("failed to read job request: {err}"))?;
    if line.trim().is_empty() {
        return Err("no job request on stdin".to_string());
    }
    serde_json::from_str(line.trim()).map_err(|err| format!("malformed job request: {err}"))
}

fn main() {
    capture_logging::initialize(LogDestination::Stderr);

    let request = match read_request() {
        Ok(request) => request,
        Err(err) => {
            capture_error!("{err}");
            std::process::exit(2);
        }
    };

    let settings = FetchSettings::default();
    let fetcher = ReqwestSiteFetcher::new(settings.clone());
    let sink = StdoutEventSink::new();

    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let result = runtime.block_on(run_capture(&request, &fetcher, &settings, &sink));

    // Every fault becomes a log frame; the supervisor's only failure
    // signal is "exited without downloadReady".
    if let Err(err) = result {
        sink.emit(WorkerEvent::Log {
            severity: Severity::Error,
            message: format!("capture job failed: {err}"),
        });
        std::process::exit(1);
    }
}
