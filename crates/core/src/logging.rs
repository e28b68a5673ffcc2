//! User-facing batch log.
//!
//! Batch progress is reported as short human-readable lines tagged with a
//! color. Callers such as a GUI supply a [`LogSink`]; without one the lines go
//! to stdout with ANSI colors. Each line is also emitted as a `tracing` event.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};

/// Severity tag of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTag {
    /// Progress and housekeeping (blue).
    Info,
    /// Something worth a look (orange).
    Warning,
    /// A document was converted (green).
    Success,
    /// A failure (red).
    Error,
}

impl LogTag {
    /// Color name used by GUI front ends.
    pub fn color(self) -> &'static str {
        match self {
            LogTag::Info => "blue",
            LogTag::Warning => "orange",
            LogTag::Success => "green",
            LogTag::Error => "red",
        }
    }

    fn ansi(self) -> &'static str {
        match self {
            LogTag::Info => "\x1b[94m",
            LogTag::Warning => "\x1b[93m",
            LogTag::Success => "\x1b[92m",
            LogTag::Error => "\x1b[91m",
        }
    }
}

impl fmt::Display for LogTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.color())
    }
}

const ANSI_RESET: &str = "\x1b[0m";

/// Receiver of batch log lines. Called from worker threads.
pub type LogSink = Arc<dyn Fn(&str, LogTag) + Send + Sync>;

/// Serializes log lines from all workers into one sink.
#[derive(Clone, Default)]
pub struct BatchLogger {
    sink: Option<LogSink>,
    lock: Arc<Mutex<()>>,
}

impl fmt::Debug for BatchLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchLogger")
            .field("custom_sink", &self.sink.is_some())
            .finish()
    }
}

impl BatchLogger {
    /// Log to stdout with ANSI colors.
    pub fn console() -> Self {
        Self::default()
    }

    /// Log to a caller-supplied sink.
    pub fn with_sink(sink: LogSink) -> Self {
        Self {
            sink: Some(sink),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Emit one line.
    pub fn log(&self, tag: LogTag, message: &str) {
        match tag {
            LogTag::Info | LogTag::Success => info!(tag = %tag, "{}", message),
            LogTag::Warning => warn!(tag = %tag, "{}", message),
            LogTag::Error => error!(tag = %tag, "{}", message),
        }

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        match &self.sink {
            Some(sink) => sink(message, tag),
            None => println!("{}{}{}", tag.ansi(), message, ANSI_RESET),
        }
    }

    pub fn info(&self, message: &str) {
        self.log(LogTag::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(LogTag::Warning, message);
    }

    pub fn success(&self, message: &str) {
        self.log(LogTag::Success, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogTag::Error, message);
    }
}

/// Initialize the library's tracing output.
/// Call this once at application startup if you want to see logs.
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
}
