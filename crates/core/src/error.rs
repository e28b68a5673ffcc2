//! Error types for word-to-pdf batch conversion.

use crate::automation::{AutomationError, AutomationStage};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the word-to-pdf library.
///
/// Everything except [`ConversionError::OutputDirError`] and
/// [`ConversionError::InvalidConfig`] is scoped to a single document and ends
/// up as the message of a failed [`crate::ConversionResult`].
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Output directory creation failed. Aborts the whole batch.
    #[error("Could not create output directory '{path}': {message}")]
    OutputDirError { path: PathBuf, message: String },

    /// Input file not found.
    #[error("Source file does not exist: {0}")]
    InputNotFound(PathBuf),

    /// The automation application could not be launched for a worker.
    #[error("Could not launch the document application: {0}")]
    InstanceCreation(#[source] AutomationError),

    /// Opening, saving or closing the document failed.
    #[error("Conversion of '{file}' failed while {stage}: {error}")]
    Automation {
        file: String,
        stage: AutomationStage,
        #[source]
        error: AutomationError,
    },

    /// The reserved output path is longer than the automation layer accepts.
    #[error("Output path is {len} characters long, exceeding the {limit} character limit: {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        limit: usize,
    },

    /// A worker picked up the task after a stop was requested.
    #[error("Stopped by user")]
    Stopped,

    /// The task was still queued when the batch was stopped.
    #[error("Stopped by user before processing")]
    StoppedBeforeStart,

    /// The task was left in the queue with no worker to run it.
    #[error("Not processed: no worker was available")]
    NoWorkerAvailable,

    /// The backend panicked while this document was being converted.
    #[error("Conversion aborted unexpectedly: {0}")]
    TaskPanicked(String),

    /// The worker holding the task died before recording a result.
    #[error("Worker terminated unexpectedly")]
    WorkerTerminated,

    /// Unrecognized naming rule label.
    #[error("Unknown naming rule '{0}'")]
    UnknownNamingRule(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Channel communication error.
    #[error("Internal channel error: {0}")]
    ChannelError(String),

    /// The blocking batch task could not be joined.
    #[error("Batch task failed: {0}")]
    BatchJoin(String),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, ConversionError>;

impl From<tokio::task::JoinError> for ConversionError {
    fn from(e: tokio::task::JoinError) -> Self {
        ConversionError::BatchJoin(e.to_string())
    }
}

impl<T> From<crossbeam_channel::SendError<T>> for ConversionError {
    fn from(_: crossbeam_channel::SendError<T>) -> Self {
        ConversionError::ChannelError("Task queue closed".to_string())
    }
}

impl ConversionError {
    /// Whether this failure was caused by a stop request.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            ConversionError::Stopped | ConversionError::StoppedBeforeStart
        )
    }
}
