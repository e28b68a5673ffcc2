//! Worker threads for parallel document conversion.
//!
//! Each worker owns one instance of the document application. Workers pull
//! tasks from a shared queue, reserve a unique output path, convert the
//! document, and record exactly one result per task. The instance is launched
//! lazily on the first real task and released when the worker exits, however
//! it exits. A backend panic fails only the task it happened in; the worker
//! releases its instance and launches a fresh one for the next task.

use crate::automation::{
    AutomationDocument, AutomationError, AutomationInstance, AutomationStage, DocumentConverter,
    OpenOptions,
};
use crate::config::{BatchConfig, ConversionResult, ConversionTask};
use crate::error::{ConversionError, Result};
use crate::logging::BatchLogger;
use crate::naming::{proposed_pdf_name, NamingRule};
use crate::unique::FilenameTracker;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info_span, Span};

/// Results of a batch keyed by input index. Each index is written once.
#[derive(Debug, Default)]
pub struct ResultMap {
    inner: Mutex<BTreeMap<usize, ConversionResult>>,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a result. Returns `false` and keeps the existing entry if the
    /// index already has one.
    pub fn record(&self, result: ConversionResult) -> bool {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if map.contains_key(&result.original_index) {
            return false;
        }
        map.insert(result.original_index, result);
        true
    }

    pub fn contains(&self, index: usize) -> bool {
        let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Results ordered by input index.
    pub fn into_sorted(self) -> Vec<ConversionResult> {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_values()
            .collect()
    }
}

/// State shared by every worker of one batch. Owned by the orchestrator;
/// workers only borrow it.
pub(crate) struct BatchContext<'a, C: DocumentConverter> {
    pub converter: &'a C,
    pub config: &'a BatchConfig,
    pub output_dir: &'a Path,
    pub naming_rule: NamingRule,
    pub tracker: &'a FilenameTracker,
    pub results: &'a ResultMap,
    pub stop: &'a AtomicBool,
    pub logger: &'a BatchLogger,
    pub total_files: usize,
    pub span: &'a Span,
}

impl<C: DocumentConverter> BatchContext<'_, C> {
    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// What one worker did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub converted: usize,
    pub failed: usize,
    /// Whether the worker ever launched an application instance.
    pub instance_launched: bool,
}

/// Owns a worker's application instance and releases it on drop.
struct InstanceGuard<'a, I: AutomationInstance> {
    worker_id: usize,
    instance: Option<I>,
    launched: bool,
    logger: &'a BatchLogger,
}

impl<'a, I: AutomationInstance> InstanceGuard<'a, I> {
    fn new(worker_id: usize, logger: &'a BatchLogger) -> Self {
        Self {
            worker_id,
            instance: None,
            launched: false,
            logger,
        }
    }

    /// The running instance, launching one if there is none yet.
    fn get_or_launch<C>(&mut self, converter: &C) -> std::result::Result<&mut I, AutomationError>
    where
        C: DocumentConverter<Instance = I>,
    {
        let instance = match self.instance.take() {
            Some(instance) => instance,
            None => {
                let instance = converter.create_instance()?;
                self.launched = true;
                self.logger.info(&format!(
                    "Worker {} launched a new application instance",
                    self.worker_id
                ));
                instance
            }
        };
        Ok(self.instance.insert(instance))
    }

    /// Release the running instance, if any. The next task launches a new one.
    fn discard(&mut self) {
        let Some(instance) = self.instance.take() else {
            return;
        };
        match instance.release() {
            Ok(()) => self.logger.info(&format!(
                "Worker {} quit its application instance",
                self.worker_id
            )),
            Err(e) => self.logger.error(&format!(
                "Worker {} could not quit its application instance: {}",
                self.worker_id, e
            )),
        }
    }
}

/// Text of a caught panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl<I: AutomationInstance> Drop for InstanceGuard<'_, I> {
    fn drop(&mut self) {
        self.discard();
    }
}

/// Open `input`, save it as PDF at `output`, and close it without saving
/// changes. A document left open by a failed save is still closed.
fn convert_document<I: AutomationInstance>(
    instance: &mut I,
    input: &Path,
    output: &Path,
    file: &str,
    logger: &BatchLogger,
) -> Result<()> {
    let automation = |stage, error| ConversionError::Automation {
        file: file.to_string(),
        stage,
        error,
    };

    let source = std::path::absolute(input).unwrap_or_else(|_| input.to_path_buf());
    let mut document = instance
        .open(&source, &OpenOptions::default())
        .map_err(|e| automation(AutomationStage::Opening, e))?;

    if let Err(e) = document.save_as_pdf(output) {
        if let Err(close_err) = document.close(true) {
            logger.error(&format!(
                "Error closing '{}' after a failed save: {}",
                file, close_err
            ));
        }
        return Err(automation(AutomationStage::Saving, e));
    }

    document
        .close(true)
        .map_err(|e| automation(AutomationStage::Closing, e))
}

/// One worker thread's task loop.
pub(crate) struct ConversionWorker<'a, C: DocumentConverter> {
    id: usize,
    ctx: &'a BatchContext<'a, C>,
    queue: Receiver<ConversionTask>,
}

impl<'a, C: DocumentConverter> ConversionWorker<'a, C> {
    pub fn new(id: usize, ctx: &'a BatchContext<'a, C>, queue: Receiver<ConversionTask>) -> Self {
        Self { id, ctx, queue }
    }

    /// Process tasks until the queue is empty or a stop is requested.
    pub fn run(self) -> WorkerSummary {
        let span = info_span!(parent: self.ctx.span, "worker", id = self.id);
        let _enter = span.enter();

        let mut instance = InstanceGuard::new(self.id, self.ctx.logger);
        let mut summary = WorkerSummary {
            worker_id: self.id,
            ..Default::default()
        };

        loop {
            if self.ctx.stop_requested() {
                debug!("Worker {} saw the stop signal", self.id);
                break;
            }

            let task = match self.queue.recv_timeout(self.ctx.config.dequeue_timeout) {
                Ok(task) => task,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    debug!("Worker {} found the queue empty", self.id);
                    break;
                }
            };

            let result = match panic::catch_unwind(AssertUnwindSafe(|| {
                self.process(&task, &mut instance)
            })) {
                Ok(result) => result,
                Err(payload) => self.recover_from_panic(&task, &mut instance, payload.as_ref()),
            };
            if result.is_success() {
                summary.converted += 1;
            } else {
                summary.failed += 1;
            }
            self.ctx.results.record(result);
        }

        summary.instance_launched = instance.launched;
        summary
    }

    /// Fail a task whose conversion panicked. The instance may be left in an
    /// unknown state, so it is released and relaunched on the next task.
    fn recover_from_panic(
        &self,
        task: &ConversionTask,
        instance: &mut InstanceGuard<'_, C::Instance>,
        payload: &(dyn Any + Send),
    ) -> ConversionResult {
        let err = ConversionError::TaskPanicked(panic_message(payload));
        self.ctx.logger.error(&format!(
            "[{}/{}] Worker {} failed on '{}': {}",
            task.original_index + 1,
            self.ctx.total_files,
            self.id,
            task.display_name(),
            err
        ));
        instance.discard();
        ConversionResult::failed(task, &err)
    }

    fn process(
        &self,
        task: &ConversionTask,
        instance: &mut InstanceGuard<'_, C::Instance>,
    ) -> ConversionResult {
        let ctx = self.ctx;
        let progress = format!("[{}/{}]", task.original_index + 1, ctx.total_files);
        let name = task.display_name();

        if ctx.stop_requested() {
            ctx.logger
                .warning(&format!("{} Skipping '{}': stopped by user", progress, name));
            return ConversionResult::failed(task, &ConversionError::Stopped);
        }

        let app = match instance.get_or_launch(ctx.converter) {
            Ok(app) => app,
            Err(e) => {
                let err = ConversionError::InstanceCreation(e);
                ctx.logger.error(&format!(
                    "{} Worker {} cannot convert '{}': {}",
                    progress, self.id, name, err
                ));
                return ConversionResult::failed(task, &err);
            }
        };

        if !task.input_path.exists() {
            let err = ConversionError::InputNotFound(task.input_path.clone());
            ctx.logger
                .error(&format!("{} Skipping '{}': {}", progress, name, err));
            return ConversionResult::failed(task, &err);
        }

        let proposed = proposed_pdf_name(&task.input_path, ctx.naming_rule);
        let reservation = ctx.tracker.reserve(ctx.output_dir, &proposed);

        let len = reservation.path.to_string_lossy().chars().count();
        if len > ctx.config.max_output_path_len {
            let err = ConversionError::PathTooLong {
                path: reservation.path,
                len,
                limit: ctx.config.max_output_path_len,
            };
            ctx.logger
                .error(&format!("{} Skipping '{}': {}", progress, name, err));
            return ConversionResult::failed(task, &err);
        }

        ctx.logger
            .warning(&format!("{} Processing: {}", progress, name));

        match convert_document(app, &task.input_path, &reservation.path, &name, ctx.logger) {
            Ok(()) => {
                ctx.logger.success(&format!(
                    "{} Successfully converted: {} -> {}",
                    progress, name, reservation.file_name
                ));
                ConversionResult::success(
                    task,
                    reservation.file_name,
                    reservation.path,
                    reservation.renamed,
                )
            }
            Err(e) => {
                ctx.logger.error(&format!("{} {}", progress, e));
                ConversionResult::failed(task, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::HRESULT_SHARING_VIOLATION;
    use crate::config::ConversionStatus;
    use crate::logging::LogTag;
    use crossbeam_channel::unbounded;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    // ========== Scripted automation backend ==========

    #[derive(Default)]
    struct Script {
        fail_launches: AtomicUsize,
        fail_open_for: Option<&'static str>,
        fail_save_for: Option<&'static str>,
        panic_open_for: Option<&'static str>,
        fail_close: bool,
        launched: AtomicUsize,
        released: AtomicUsize,
        opened: AtomicUsize,
        closed: AtomicUsize,
    }

    struct FakeConverter(Arc<Script>);

    struct FakeInstance {
        script: Arc<Script>,
        // Instances are thread-bound, like COM objects.
        _not_send: std::marker::PhantomData<*const ()>,
    }

    struct FakeDocument {
        script: Arc<Script>,
        name: String,
    }

    impl DocumentConverter for FakeConverter {
        type Instance = FakeInstance;

        fn create_instance(&self) -> std::result::Result<FakeInstance, AutomationError> {
            let remaining = self.0.fail_launches.load(Ordering::SeqCst);
            if remaining > 0 {
                self.0.fail_launches.store(remaining - 1, Ordering::SeqCst);
                return Err(AutomationError::new("Server execution failed"));
            }
            self.0.launched.fetch_add(1, Ordering::SeqCst);
            Ok(FakeInstance {
                script: Arc::clone(&self.0),
                _not_send: std::marker::PhantomData,
            })
        }
    }

    impl AutomationInstance for FakeInstance {
        type Document = FakeDocument;

        fn open(
            &mut self,
            path: &Path,
            options: &OpenOptions,
        ) -> std::result::Result<FakeDocument, AutomationError> {
            assert!(options.read_only);
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if self.script.panic_open_for == Some(name.as_str()) {
                panic!("automation server crashed on {}", name);
            }
            if self.script.fail_open_for == Some(name.as_str()) {
                return Err(AutomationError::with_hresult(
                    "The document is locked",
                    HRESULT_SHARING_VIOLATION,
                ));
            }
            self.script.opened.fetch_add(1, Ordering::SeqCst);
            Ok(FakeDocument {
                script: Arc::clone(&self.script),
                name,
            })
        }

        fn release(self) -> std::result::Result<(), AutomationError> {
            self.script.released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl AutomationDocument for FakeDocument {
        fn save_as_pdf(&mut self, path: &Path) -> std::result::Result<(), AutomationError> {
            if self.script.fail_save_for == Some(self.name.as_str()) {
                return Err(AutomationError::new("Disk full"));
            }
            fs::write(path, b"%PDF-1.7").map_err(|e| AutomationError::new(e.to_string()))
        }

        fn close(self, discard_changes: bool) -> std::result::Result<(), AutomationError> {
            assert!(discard_changes);
            self.script.closed.fetch_add(1, Ordering::SeqCst);
            if self.script.fail_close {
                return Err(AutomationError::new("Close failed"));
            }
            Ok(())
        }
    }

    // ========== Harness ==========

    struct Harness {
        input_dir: TempDir,
        output_dir: TempDir,
        config: BatchConfig,
        tracker: FilenameTracker,
        results: ResultMap,
        stop: AtomicBool,
        logger: BatchLogger,
        span: Span,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                input_dir: TempDir::new().unwrap(),
                output_dir: TempDir::new().unwrap(),
                config: BatchConfig::with_worker_count(1).dequeue_timeout(Duration::from_millis(10)),
                tracker: FilenameTracker::new(),
                results: ResultMap::new(),
                stop: AtomicBool::new(false),
                logger: BatchLogger::with_sink(Arc::new(|_: &str, _: LogTag| {})),
                span: Span::none(),
            }
        }

        fn input(&self, name: &str) -> PathBuf {
            let path = self.input_dir.path().join(name);
            fs::write(&path, b"docx").unwrap();
            path
        }

        fn run(
            &mut self,
            converter: &FakeConverter,
            tasks: Vec<ConversionTask>,
        ) -> (WorkerSummary, Vec<ConversionResult>) {
            let (tx, rx) = unbounded();
            let total_files = tasks.len();
            for task in tasks {
                tx.send(task).unwrap();
            }
            drop(tx);

            let ctx = BatchContext {
                converter,
                config: &self.config,
                output_dir: self.output_dir.path(),
                naming_rule: NamingRule::RemoveSquareBrackets,
                tracker: &self.tracker,
                results: &self.results,
                stop: &self.stop,
                logger: &self.logger,
                total_files,
                span: &self.span,
            };
            let summary = ConversionWorker::new(0, &ctx, rx).run();
            drop(ctx);
            (summary, std::mem::take(&mut self.results).into_sorted())
        }
    }

    // ========== ResultMap tests ==========

    #[test]
    fn test_result_map_keeps_first_write() {
        let map = ResultMap::new();
        let task = ConversionTask::new(0, "a.docx");
        assert!(map.record(ConversionResult::failed(&task, &ConversionError::Stopped)));
        assert!(!map.record(ConversionResult::failed(&task, &ConversionError::WorkerTerminated)));
        assert_eq!(map.len(), 1);
        assert!(map.contains(0));
        assert_eq!(map.into_sorted()[0].message, "Stopped by user");
    }

    #[test]
    fn test_result_map_sorted_by_index() {
        let map = ResultMap::new();
        for i in [3, 0, 2, 1] {
            map.record(ConversionResult::failed(&ConversionTask::new(i, "x.docx"), &ConversionError::Stopped));
        }
        let order: Vec<_> = map.into_sorted().iter().map(|r| r.original_index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    // ========== Worker tests ==========

    #[test]
    fn test_worker_converts_and_releases_instance() {
        let mut h = Harness::new();
        let script = Arc::new(Script::default());
        let converter = FakeConverter(Arc::clone(&script));
        let tasks = vec![
            ConversionTask::new(0, h.input("Report [Draft].docx")),
            ConversionTask::new(1, h.input("Report [Final].docx")),
        ];
        let out = h.output_dir.path().to_path_buf();

        let (summary, results) = h.run(&converter, tasks);

        assert_eq!(summary.converted, 2);
        assert!(summary.instance_launched);
        assert_eq!(results[0].output_filename.as_deref(), Some("Report.pdf"));
        assert_eq!(results[1].output_filename.as_deref(), Some("Report (1).pdf"));
        assert!(results[1].renamed_due_to_collision);
        assert!(out.join("Report.pdf").exists());
        assert_eq!(script.launched.load(Ordering::SeqCst), 1);
        assert_eq!(script.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_worker_without_tasks_never_launches() {
        let mut h = Harness::new();
        let script = Arc::new(Script::default());
        let converter = FakeConverter(Arc::clone(&script));

        let (summary, results) = h.run(&converter, Vec::new());

        assert!(!summary.instance_launched);
        assert!(results.is_empty());
        assert_eq!(script.launched.load(Ordering::SeqCst), 0);
        assert_eq!(script.released.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_worker_retries_launch_on_next_task() {
        let mut h = Harness::new();
        let script = Arc::new(Script {
            fail_launches: AtomicUsize::new(1),
            ..Default::default()
        });
        let converter = FakeConverter(Arc::clone(&script));
        let tasks = vec![
            ConversionTask::new(0, h.input("a.docx")),
            ConversionTask::new(1, h.input("b.docx")),
        ];

        let (summary, results) = h.run(&converter, tasks);

        assert_eq!(results[0].status, ConversionStatus::Failed);
        assert!(results[0].message.contains("Could not launch"));
        assert!(results[0].message.contains("Server execution failed"));
        assert_eq!(results[1].status, ConversionStatus::Success);
        assert_eq!(summary.failed, 1);
        assert_eq!(script.launched.load(Ordering::SeqCst), 1);
        assert_eq!(script.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_worker_reports_vanished_source() {
        let mut h = Harness::new();
        let converter = FakeConverter(Arc::new(Script::default()));
        let path = h.input("gone.docx");
        fs::remove_file(&path).unwrap();

        let (_, results) = h.run(&converter, vec![ConversionTask::new(0, path)]);

        assert_eq!(results[0].status, ConversionStatus::Failed);
        assert!(results[0].message.contains("does not exist"));
    }

    #[test]
    fn test_worker_skips_overlong_output_path() {
        let mut h = Harness::new();
        h.config = h.config.clone().max_output_path_len(10);
        let script = Arc::new(Script::default());
        let converter = FakeConverter(Arc::clone(&script));

        let tasks = vec![ConversionTask::new(0, h.input("a.docx"))];

        let (_, results) = h.run(&converter, tasks);

        assert_eq!(results[0].status, ConversionStatus::Failed);
        assert!(results[0].message.contains("character limit"));
        assert_eq!(script.opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_worker_classifies_locked_file() {
        let mut h = Harness::new();
        let script = Arc::new(Script {
            fail_open_for: Some("locked.docx"),
            ..Default::default()
        });
        let converter = FakeConverter(Arc::clone(&script));
        let tasks = vec![
            ConversionTask::new(0, h.input("locked.docx")),
            ConversionTask::new(1, h.input("fine.docx")),
        ];

        let (_, results) = h.run(&converter, tasks);

        assert_eq!(results[0].status, ConversionStatus::Failed);
        assert!(results[0].message.contains("opening the document"));
        assert!(results[0].message.contains("locked by another application"));
        assert_eq!(results[1].status, ConversionStatus::Success);
    }

    #[test]
    fn test_worker_closes_document_after_failed_save() {
        let mut h = Harness::new();
        let script = Arc::new(Script {
            fail_save_for: Some("big.docx"),
            ..Default::default()
        });
        let converter = FakeConverter(Arc::clone(&script));

        let tasks = vec![ConversionTask::new(0, h.input("big.docx"))];

        let (_, results) = h.run(&converter, tasks);

        assert!(results[0].message.contains("saving as PDF"));
        assert!(results[0].message.contains("Disk full"));
        assert_eq!(script.opened.load(Ordering::SeqCst), 1);
        assert_eq!(script.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_worker_close_failure_is_a_failed_result() {
        let mut h = Harness::new();
        let script = Arc::new(Script {
            fail_close: true,
            ..Default::default()
        });
        let converter = FakeConverter(Arc::clone(&script));

        let tasks = vec![ConversionTask::new(0, h.input("a.docx"))];

        let (_, results) = h.run(&converter, tasks);

        assert_eq!(results[0].status, ConversionStatus::Failed);
        assert!(results[0].message.contains("closing the document"));
        assert_eq!(script.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_worker_exits_immediately_when_stopped() {
        let mut h = Harness::new();
        h.stop.store(true, Ordering::SeqCst);
        let script = Arc::new(Script::default());
        let converter = FakeConverter(Arc::clone(&script));

        let tasks = vec![ConversionTask::new(0, h.input("a.docx"))];

        let (summary, results) = h.run(&converter, tasks);

        assert_eq!(summary, WorkerSummary { worker_id: 0, ..Default::default() });
        assert!(results.is_empty());
        assert_eq!(script.launched.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_worker_survives_backend_panic() {
        let mut h = Harness::new();
        let script = Arc::new(Script {
            panic_open_for: Some("boom.docx"),
            ..Default::default()
        });
        let converter = FakeConverter(Arc::clone(&script));
        let tasks = vec![
            ConversionTask::new(0, h.input("a.docx")),
            ConversionTask::new(1, h.input("boom.docx")),
            ConversionTask::new(2, h.input("c.docx")),
            ConversionTask::new(3, h.input("d.docx")),
        ];

        let (summary, results) = h.run(&converter, tasks);

        assert_eq!(results.len(), 4);
        assert_eq!(summary.converted, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(results[1].status, ConversionStatus::Failed);
        assert!(results[1].message.contains("aborted unexpectedly"));
        assert!(results[1].message.contains("automation server crashed on boom.docx"));
        assert!(results[2].is_success());
        assert!(results[3].is_success());

        // The instance that panicked is replaced before the next task.
        assert_eq!(script.launched.load(Ordering::SeqCst), 2);
        assert_eq!(script.released.load(Ordering::SeqCst), 2);
    }

    // ========== InstanceGuard tests ==========

    #[test]
    fn test_guard_releases_instance_when_unwinding() {
        let script = Arc::new(Script::default());
        let converter = FakeConverter(Arc::clone(&script));
        let logger = BatchLogger::with_sink(Arc::new(|_: &str, _: LogTag| {}));

        let outcome = std::thread::scope(|s| {
            s.spawn(|| {
                let mut guard = InstanceGuard::new(7, &logger);
                guard.get_or_launch(&converter).unwrap();
                panic!("worker died mid-task");
            })
            .join()
        });

        assert!(outcome.is_err());
        assert_eq!(script.launched.load(Ordering::SeqCst), 1);
        assert_eq!(script.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_discard_allows_relaunch() {
        let script = Arc::new(Script::default());
        let converter = FakeConverter(Arc::clone(&script));
        let logger = BatchLogger::with_sink(Arc::new(|_: &str, _: LogTag| {}));

        {
            let mut guard = InstanceGuard::new(0, &logger);
            guard.get_or_launch(&converter).unwrap();
            guard.discard();
            guard.discard();
            assert_eq!(script.released.load(Ordering::SeqCst), 1);
            guard.get_or_launch(&converter).unwrap();
        }

        assert_eq!(script.launched.load(Ordering::SeqCst), 2);
        assert_eq!(script.released.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panic_message_payloads() {
        let text: Box<dyn Any + Send> = Box::new("static text");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned text"));
        let other: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(text.as_ref()), "static text");
        assert_eq!(panic_message(owned.as_ref()), "owned text");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
