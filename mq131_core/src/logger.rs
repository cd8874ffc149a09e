//! Human-readable progress sink for long operations such as calibration.
//!
//! Structured events always go through `tracing`; a `Logger` is an optional
//! extra channel (a file, a console, a test buffer) for plain progress lines.

use std::path::PathBuf;
use std::sync::Mutex;

pub trait Logger {
    fn info(&self, message: &str);
}

/// Appends each message as one line to a file, creating it if needed.
pub struct FileLogger {
    path: PathBuf,
}

impl FileLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Logger for FileLogger {
    fn info(&self, message: &str) {
        use std::fs::OpenOptions;
        use std::io::Write;
        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{message}") {
                    tracing::warn!(path = ?self.path, error = %e, "progress log write failed");
                }
            }
            Err(e) => tracing::warn!(path = ?self.path, error = %e, "progress log open failed"),
        }
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl Logger for MemoryLogger {
    fn info(&self, message: &str) {
        if let Ok(mut g) = self.lines.lock() {
            g.push(message.to_owned());
        }
    }
}
