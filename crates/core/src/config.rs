//! Configuration and data types for batch conversion.

use crate::error::{ConversionError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Default number of workers, each owning one application instance.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Longest output path the automation layer is asked to write.
pub const DEFAULT_MAX_OUTPUT_PATH_LEN: usize = 255;

/// Configuration for the worker pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of worker threads (and application instances).
    /// Default: 4.
    pub worker_count: usize,

    /// How long an idle worker waits on the queue before deciding it is empty.
    /// Default: 100 milliseconds.
    pub dequeue_timeout: Duration,

    /// Output paths longer than this many characters fail without being
    /// attempted.
    /// Default: 255.
    pub max_output_path_len: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            dequeue_timeout: Duration::from_millis(100),
            max_output_path_len: DEFAULT_MAX_OUTPUT_PATH_LEN,
        }
    }
}

impl BatchConfig {
    /// Create a config with the given number of workers.
    pub fn with_worker_count(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Default::default()
        }
    }

    /// Set the queue wait.
    pub fn dequeue_timeout(mut self, timeout: Duration) -> Self {
        self.dequeue_timeout = timeout;
        self
    }

    /// Set the output path length limit.
    pub fn max_output_path_len(mut self, len: usize) -> Self {
        self.max_output_path_len = len;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(ConversionError::InvalidConfig(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.dequeue_timeout.is_zero() {
            return Err(ConversionError::InvalidConfig(
                "dequeue_timeout must be greater than 0".to_string(),
            ));
        }
        if self.max_output_path_len == 0 {
            return Err(ConversionError::InvalidConfig(
                "max_output_path_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One document waiting in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    /// Position in the caller's input list.
    pub original_index: usize,
    /// Source document.
    pub input_path: PathBuf,
}

impl ConversionTask {
    pub fn new(original_index: usize, input_path: impl Into<PathBuf>) -> Self {
        Self {
            original_index,
            input_path: input_path.into(),
        }
    }

    /// Source file name for log lines.
    pub fn display_name(&self) -> String {
        display_name(&self.input_path)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Outcome of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionStatus {
    Success,
    Failed,
}

/// Per-document report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Position in the caller's input list.
    pub original_index: usize,
    /// Source file name without directory.
    pub original_filename: String,
    /// Source path as given by the caller.
    pub input_path: PathBuf,
    /// Name of the written PDF, when one was reserved.
    pub output_filename: Option<String>,
    /// Absolute path of the written PDF, when one was reserved.
    pub output_path: Option<PathBuf>,
    pub status: ConversionStatus,
    /// Success note or failure reason.
    pub message: String,
    /// Whether the output name got a ` (N)` suffix.
    pub renamed_due_to_collision: bool,
}

impl ConversionResult {
    /// A converted document.
    pub fn success(
        task: &ConversionTask,
        output_filename: String,
        output_path: PathBuf,
        renamed: bool,
    ) -> Self {
        let message = if renamed {
            format!("Converted (renamed to '{}' to avoid a name collision)", output_filename)
        } else {
            "Converted successfully".to_string()
        };
        Self {
            original_index: task.original_index,
            original_filename: task.display_name(),
            input_path: task.input_path.clone(),
            output_filename: Some(output_filename),
            output_path: Some(output_path),
            status: ConversionStatus::Success,
            message,
            renamed_due_to_collision: renamed,
        }
    }

    /// A document that was not converted.
    pub fn failed(task: &ConversionTask, error: &ConversionError) -> Self {
        Self {
            original_index: task.original_index,
            original_filename: task.display_name(),
            input_path: task.input_path.clone(),
            output_filename: None,
            output_path: None,
            status: ConversionStatus::Failed,
            message: error.to_string(),
            renamed_due_to_collision: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ConversionStatus::Success
    }
}

/// Result of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Identifier used in the batch's tracing span.
    pub batch_id: Uuid,

    /// One entry per input file, ordered by input index.
    pub results: Vec<ConversionResult>,

    pub success_count: usize,
    pub failed_count: usize,
    pub total_count: usize,

    /// Whether a stop was requested during the run.
    pub stopped: bool,

    /// Why the batch could not start, when nothing was attempted.
    #[serde(default)]
    pub setup_error: Option<String>,

    /// Wall-clock time of the run.
    pub duration: Duration,
}

impl BatchResult {
    /// Result of a batch with no input files.
    pub fn empty(batch_id: Uuid) -> Self {
        Self::from_results(batch_id, Vec::new(), false, Duration::ZERO)
    }

    /// Result of a batch that could not start. No document is reported.
    pub fn setup_failed(batch_id: Uuid, error: &ConversionError, duration: Duration) -> Self {
        Self {
            setup_error: Some(error.to_string()),
            ..Self::from_results(batch_id, Vec::new(), false, duration)
        }
    }

    /// Build the counts from ordered results.
    pub fn from_results(
        batch_id: Uuid,
        results: Vec<ConversionResult>,
        stopped: bool,
        duration: Duration,
    ) -> Self {
        let success_count = results.iter().filter(|r| r.is_success()).count();
        let total_count = results.len();
        Self {
            batch_id,
            success_count,
            failed_count: total_count - success_count,
            total_count,
            results,
            stopped,
            setup_error: None,
            duration,
        }
    }

    /// `(success, failed, total)`.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.success_count, self.failed_count, self.total_count)
    }

    /// Failed entries only.
    pub fn failures(&self) -> impl Iterator<Item = &ConversionResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// Pretty-printed JSON report.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
