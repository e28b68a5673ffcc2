//! # word-to-pdf-core
//!
//! Parallel batch conversion of word-processing documents to PDF.
//!
//! Conversion itself is done by an external document-editing application
//! driven through automation. This library coordinates a fixed pool of
//! worker threads, each owning one instance of that application:
//!
//! - **Naming rules** turn `Report [Draft].docx` into `Report.pdf`
//! - **Collision-free output paths** (`Report (1).pdf`, ...) even when many
//!   workers finish at once
//! - **Cooperative cancellation** through [`BatchConverter::stop`]
//! - **One result per input file**, in input order, whatever happened
//!
//! The application is reached through the traits in [`automation`]; a
//! backend implements [`DocumentConverter`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use word_to_pdf_core::{BatchConverterBuilder, BatchRequest, DocumentConverter, NamingRule};
//!
//! fn convert_all<C: DocumentConverter>(backend: C) -> word_to_pdf_core::Result<()> {
//!     let converter = BatchConverterBuilder::new().worker_count(4).build(backend)?;
//!
//!     let request = BatchRequest::new(["minutes [draft].docx", "budget.doc"], "./pdf")
//!         .with_naming_rule(NamingRule::RemoveSquareBrackets);
//!     let result = converter.run(request)?;
//!
//!     for entry in &result.results {
//!         println!("{} -> {:?}: {}", entry.original_filename, entry.output_filename, entry.message);
//!     }
//!     println!(
//!         "Converted {} of {} ({} failed)",
//!         result.success_count, result.total_count, result.failed_count
//!     );
//!     Ok(())
//! }
//! ```

pub mod automation;
pub mod config;
pub mod converter;
pub mod error;
pub mod logging;
pub mod naming;
pub mod pool;
pub mod unique;

// Re-export main types for convenience
pub use automation::{
    AutomationDocument, AutomationError, AutomationFailureKind, AutomationInstance,
    AutomationStage, DocumentConverter, OpenOptions,
};
pub use config::{BatchConfig, BatchResult, ConversionResult, ConversionStatus, ConversionTask};
pub use converter::{BatchConverter, BatchConverterBuilder, BatchPhase, BatchRequest, StopHandle};
pub use error::{ConversionError, Result};
pub use logging::{init_logging, BatchLogger, LogSink, LogTag};
pub use naming::{preview_names, proposed_pdf_name, NamingRule};
pub use pool::{ResultMap, WorkerSummary};
pub use unique::{FilenameTracker, Reservation};

/// Word-processing extensions the front ends offer for conversion.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["docx", "docm", "doc", "dotx", "dotm", "dot", "rtf", "odt"];

/// Check if a file extension is supported.
pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|&e| e.eq_ignore_ascii_case(ext))
}
