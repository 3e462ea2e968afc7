use sitegrab_core::Severity;

/// Where supervisor-side job events go. The observer is the presentation
/// layer's seam: it receives display strings and the artifact path, and
/// never a job return value.
pub trait Observer: Send + Sync {
    fn on_log(&self, severity: Severity, message: &str);
    /// A user-requested cancellation. Not a fault: rendered apart from
    /// error logs.
    fn on_cancelled(&self, message: &str);
    fn on_download_ready(&self, path: &str);
}

/// Renders job events to stdout with severity prefixes.
pub struct ConsoleObserver;

impl Observer for ConsoleObserver {
    fn on_log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => println!("{message}"),
            Severity::Warn => println!("[Warning] {message}"),
            Severity::Error => println!("[Error] {message}"),
            Severity::Done => println!("[Done] {message}"),
        }
    }

    fn on_cancelled(&self, message: &str) {
        println!("[Cancel] {message}");
    }

    fn on_download_ready(&self, path: &str) {
        println!("[Download] archive ready at {path}");
    }
}
