//! Batch orchestrator that ties together naming, path reservation and the
//! worker pool.
//!
//! [`BatchConverter::run`] validates the inputs, fills a task queue, starts a
//! fixed number of worker threads, waits for all of them, and turns whatever
//! is left into failed results so every input gets exactly one entry.
//! [`BatchConverter::stop`] asks the workers to finish their current document
//! and take no new ones.

use crate::automation::DocumentConverter;
use crate::config::{display_name, BatchConfig, BatchResult, ConversionResult, ConversionTask};
use crate::error::{ConversionError, Result};
use crate::logging::{BatchLogger, LogSink};
use crate::naming::NamingRule;
use crate::pool::{BatchContext, ConversionWorker, ResultMap, WorkerSummary};
use crate::unique::FilenameTracker;
use crossbeam_channel::unbounded;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span};
use uuid::Uuid;

/// Where a batch is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchPhase {
    /// No batch has started yet.
    Idle,
    /// Checking inputs and filling the queue.
    Preparing,
    /// Workers are converting.
    Running,
    /// Turning tasks left behind by a stop into failed results. Leftovers of
    /// a batch that was not stopped are failed without entering this phase.
    Draining,
    /// The last batch has finished.
    Completed,
}

/// Files to convert and where to put them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    /// Source documents, in report order.
    pub files: Vec<PathBuf>,
    /// Directory for the PDFs. Created if missing.
    pub output_dir: PathBuf,
    pub naming_rule: NamingRule,
}

impl BatchRequest {
    /// Create a request using [`NamingRule::OriginalName`].
    pub fn new<I, P>(files: I, output_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            output_dir: output_dir.into(),
            naming_rule: NamingRule::default(),
        }
    }

    /// Set the naming rule.
    pub fn with_naming_rule(mut self, rule: NamingRule) -> Self {
        self.naming_rule = rule;
        self
    }
}

/// Requests a cooperative stop of the running batch from another thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Ask the workers to stop after their current document. Idempotent and
    /// never blocks.
    ///
    /// A batch clears the request as soon as it owns the converter, so a stop
    /// issued while a `run` call is still waiting for a previous batch to
    /// finish applies to that previous batch only.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Converts batches of documents to PDF with a pool of application instances.
///
/// One batch runs at a time; a second `run` call waits for the first.
pub struct BatchConverter<C: DocumentConverter> {
    converter: C,
    config: BatchConfig,
    logger: BatchLogger,
    stop: Arc<AtomicBool>,
    phase: Mutex<BatchPhase>,
    batch_lock: Mutex<()>,
}

impl<C: DocumentConverter> std::fmt::Debug for BatchConverter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchConverter")
            .field("config", &self.config)
            .field("logger", &self.logger)
            .field("phase", &self.phase())
            .finish()
    }
}

impl<C: DocumentConverter> BatchConverter<C> {
    /// Create a converter that logs to the console.
    pub fn new(converter: C, config: BatchConfig) -> Result<Self> {
        Self::with_logger(converter, config, BatchLogger::console())
    }

    /// Create a converter with an explicit logger.
    pub fn with_logger(converter: C, config: BatchConfig, logger: BatchLogger) -> Result<Self> {
        config.validate()?;

        info!("Initializing batch converter with worker_count={}", config.worker_count);

        Ok(Self {
            converter,
            config,
            logger,
            stop: Arc::new(AtomicBool::new(false)),
            phase: Mutex::new(BatchPhase::Idle),
            batch_lock: Mutex::new(()),
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// The automation backend.
    pub fn backend(&self) -> &C {
        &self.converter
    }

    /// Handle for stopping batches from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::clone(&self.stop),
        }
    }

    /// Request a cooperative stop of the running batch. A batch started after
    /// this call clears the request; see [`StopHandle::stop`].
    pub fn stop(&self) {
        if !self.stop.swap(true, Ordering::SeqCst) {
            self.logger
                .warning("Stop requested. Waiting for workers to finish their current documents.");
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> BatchPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: BatchPhase) {
        debug!("Batch phase: {:?}", phase);
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    /// Parse a naming rule label, warning in the batch log and using
    /// [`NamingRule::OriginalName`] when it is not recognized.
    pub fn resolve_rule(&self, label: &str) -> NamingRule {
        match label.parse() {
            Ok(rule) => rule,
            Err(_) => {
                self.logger.warning(&format!(
                    "Warning: Unknown naming rule '{}'. Using '{}' as fallback.",
                    label,
                    NamingRule::OriginalName
                ));
                NamingRule::OriginalName
            }
        }
    }

    fn ensure_output_dir(&self, output_dir: &Path) -> Result<()> {
        if output_dir.is_dir() {
            return Ok(());
        }
        match std::fs::create_dir_all(output_dir) {
            Ok(()) => {
                self.logger
                    .info(&format!("Created output directory: {}", output_dir.display()));
                Ok(())
            }
            Err(e) => {
                let err = ConversionError::OutputDirError {
                    path: output_dir.to_path_buf(),
                    message: e.to_string(),
                };
                self.logger.error(&format!("Error: {}", err));
                Err(err)
            }
        }
    }

    /// Convert every file in `request`.
    ///
    /// Returns one result per input, ordered by input position. When the
    /// output directory cannot be created nothing is attempted: the report is
    /// empty and carries the cause in [`BatchResult::setup_error`].
    pub fn run(&self, request: BatchRequest) -> Result<BatchResult> {
        let _batch = self.batch_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.stop.store(false, Ordering::SeqCst);

        let start = Instant::now();
        let batch_id = Uuid::new_v4();
        let total_files = request.files.len();

        let span = info_span!("batch", id = %batch_id, files = total_files);
        let _enter = span.enter();

        self.set_phase(BatchPhase::Preparing);

        if request.files.is_empty() {
            self.logger.warning("No files provided for conversion.");
            self.set_phase(BatchPhase::Completed);
            return Ok(BatchResult::empty(batch_id));
        }

        if let Err(e) = self.ensure_output_dir(&request.output_dir) {
            self.set_phase(BatchPhase::Completed);
            return Ok(BatchResult::setup_failed(batch_id, &e, start.elapsed()));
        }

        let results = ResultMap::new();
        let (tx, rx) = unbounded();
        for (index, path) in request.files.iter().enumerate() {
            let task = ConversionTask::new(index, path.clone());
            if path.exists() {
                tx.send(task)?;
            } else {
                let err = ConversionError::InputNotFound(path.clone());
                self.logger.error(&format!(
                    "[{}/{}] Skipping '{}': {}",
                    index + 1,
                    total_files,
                    display_name(path),
                    err
                ));
                results.record(ConversionResult::failed(&task, &err));
            }
        }
        drop(tx);

        let queued = rx.len();
        let tracker = FilenameTracker::new();

        if queued == 0 {
            self.logger
                .warning("No valid files left to convert (all were missing).");
        } else {
            self.set_phase(BatchPhase::Running);
            let workers = self.config.worker_count;
            self.logger.info(&format!(
                "Starting concurrent conversion of {} files with {} workers...",
                queued, workers
            ));

            let ctx = BatchContext {
                converter: &self.converter,
                config: &self.config,
                output_dir: &request.output_dir,
                naming_rule: request.naming_rule,
                tracker: &tracker,
                results: &results,
                stop: &self.stop,
                logger: &self.logger,
                total_files,
                span: &span,
            };

            let summaries = self.run_workers(&ctx, &rx);
            for summary in &summaries {
                debug!(
                    "Worker {} finished: converted={}, failed={}, launched={}",
                    summary.worker_id,
                    summary.converted,
                    summary.failed,
                    summary.instance_launched
                );
            }
        }

        let stopped = self.is_stop_requested();
        self.drain_unprocessed(&rx, &results, stopped);
        let terminated = backfill_missing(&request.files, &results);
        if terminated > 0 {
            self.logger.error(&format!(
                "{} files have no result because a worker terminated unexpectedly",
                terminated
            ));
        }

        let result = BatchResult::from_results(batch_id, results.into_sorted(), stopped, start.elapsed());
        self.logger.info(&format!(
            "Batch conversion complete. Converted: {}, Failed: {}, Total: {}",
            result.success_count, result.failed_count, result.total_count
        ));
        info!("Batch {} finished in {:?}", batch_id, result.duration);

        self.set_phase(BatchPhase::Completed);
        Ok(result)
    }

    /// Turn tasks no worker picked up into failed results. Returns how many
    /// there were.
    fn drain_unprocessed(
        &self,
        rx: &crossbeam_channel::Receiver<ConversionTask>,
        results: &ResultMap,
        stopped: bool,
    ) -> usize {
        if stopped && !rx.is_empty() {
            self.set_phase(BatchPhase::Draining);
        }
        let err = if stopped {
            ConversionError::StoppedBeforeStart
        } else {
            ConversionError::NoWorkerAvailable
        };

        let mut drained = 0;
        for task in rx.try_iter() {
            results.record(ConversionResult::failed(&task, &err));
            drained += 1;
        }
        if drained > 0 {
            self.logger.warning(&format!(
                "{} queued files were not processed{}",
                drained,
                if stopped { " because the batch was stopped" } else { "" }
            ));
        }
        drained
    }

    /// Start the workers on named scoped threads and wait for all of them.
    fn run_workers(
        &self,
        ctx: &BatchContext<'_, C>,
        rx: &crossbeam_channel::Receiver<ConversionTask>,
    ) -> Vec<WorkerSummary> {
        thread::scope(|s| {
            let mut handles = Vec::with_capacity(self.config.worker_count);
            for id in 0..self.config.worker_count {
                let worker = ConversionWorker::new(id, ctx, rx.clone());
                let spawned = thread::Builder::new()
                    .name(format!("word-to-pdf-worker-{}", id))
                    .spawn_scoped(s, move || worker.run());
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => self
                        .logger
                        .error(&format!("Could not start worker thread {}: {}", id, e)),
                }
            }

            handles
                .into_iter()
                .filter_map(|handle| match handle.join() {
                    Ok(summary) => Some(summary),
                    Err(_) => {
                        self.logger.error("A worker thread terminated unexpectedly");
                        None
                    }
                })
                .collect()
        })
    }
}

/// Give every input without a result a `WorkerTerminated` failure. Returns
/// how many were filled in.
fn backfill_missing(files: &[PathBuf], results: &ResultMap) -> usize {
    let mut filled = 0;
    for (index, path) in files.iter().enumerate() {
        if !results.contains(index) {
            let task = ConversionTask::new(index, path.clone());
            results.record(ConversionResult::failed(&task, &ConversionError::WorkerTerminated));
            filled += 1;
        }
    }
    filled
}

impl<C: DocumentConverter + 'static> BatchConverter<C> {
    /// Run a batch on tokio's blocking thread pool.
    pub async fn run_async(self: Arc<Self>, request: BatchRequest) -> Result<BatchResult> {
        tokio::task::spawn_blocking(move || self.run(request)).await?
    }
}

/// Builder for creating a [`BatchConverter`] with custom settings.
pub struct BatchConverterBuilder {
    config: BatchConfig,
    logger: BatchLogger,
}

impl BatchConverterBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: BatchConfig::default(),
            logger: BatchLogger::console(),
        }
    }

    /// Set the number of workers.
    pub fn worker_count(mut self, count: usize) -> Self {
        self.config.worker_count = count;
        self
    }

    /// Set how long idle workers wait on the queue.
    pub fn dequeue_timeout(mut self, timeout: Duration) -> Self {
        self.config.dequeue_timeout = timeout;
        self
    }

    /// Set the output path length limit.
    pub fn max_output_path_len(mut self, len: usize) -> Self {
        self.config.max_output_path_len = len;
        self
    }

    /// Send batch log lines to `sink` instead of the console.
    pub fn log_sink(mut self, sink: LogSink) -> Self {
        self.logger = BatchLogger::with_sink(sink);
        self
    }

    /// Build the converter.
    pub fn build<C: DocumentConverter>(self, converter: C) -> Result<BatchConverter<C>> {
        BatchConverter::with_logger(converter, self.config, self.logger)
    }
}

impl Default for BatchConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
