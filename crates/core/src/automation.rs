//! Seam between the batch converter and the document-editing application.
//!
//! The converter never talks to the application directly. A backend
//! implements [`DocumentConverter`], which launches one
//! [`AutomationInstance`] per worker thread; the instance opens documents,
//! and each [`AutomationDocument`] can be saved as PDF and closed.
//!
//! Every call is fallible and reports an [`AutomationError`]. Errors that
//! carry an HRESULT are classified so that locked files and bad paths produce
//! messages the user can act on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// `HRESULT_FROM_WIN32(ERROR_SHARING_VIOLATION)`.
pub const HRESULT_SHARING_VIOLATION: i32 = 0x8007_0020_u32 as i32;

/// `HRESULT_FROM_WIN32(ERROR_BAD_PATHNAME)`.
pub const HRESULT_BAD_PATHNAME: i32 = 0x8007_007B_u32 as i32;

/// Options used when opening a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOptions {
    /// Open without write access so the source is never modified.
    pub read_only: bool,
    /// Show the application's format conversion prompt.
    pub confirm_conversions: bool,
    /// Add the document to the application's recent files list.
    pub add_to_recent_files: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            read_only: true,
            confirm_conversions: false,
            add_to_recent_files: false,
        }
    }
}

/// Stage of the single-document conversion that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutomationStage {
    Opening,
    Saving,
    Closing,
}

impl fmt::Display for AutomationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AutomationStage::Opening => "opening the document",
            AutomationStage::Saving => "saving as PDF",
            AutomationStage::Closing => "closing the document",
        };
        f.write_str(s)
    }
}

/// Coarse classification of an automation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomationFailureKind {
    /// The file is locked by another process.
    SharingViolation,
    /// The source or destination path is invalid or too long.
    BadPath,
    Other,
}

impl AutomationFailureKind {
    /// Classify a raw HRESULT.
    pub fn from_hresult(code: i32) -> Self {
        match code {
            HRESULT_SHARING_VIOLATION => AutomationFailureKind::SharingViolation,
            HRESULT_BAD_PATHNAME => AutomationFailureKind::BadPath,
            _ => AutomationFailureKind::Other,
        }
    }

    /// Advice shown to the user, if any.
    pub fn hint(self) -> Option<&'static str> {
        match self {
            AutomationFailureKind::SharingViolation => Some(
                "The file is in use or locked by another application (possibly another \
                 instance of the document application). Close it and try again.",
            ),
            AutomationFailureKind::BadPath => {
                Some("The source or destination path may be too long or invalid.")
            }
            AutomationFailureKind::Other => None,
        }
    }
}

/// Failure reported by the automation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationError {
    /// Human-readable description from the backend.
    pub description: String,
    /// HRESULT (or equivalent status code), when the backend has one.
    pub hresult: Option<i32>,
}

impl AutomationError {
    /// Create an error without a status code.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            hresult: None,
        }
    }

    /// Create an error carrying an HRESULT.
    pub fn with_hresult(description: impl Into<String>, hresult: i32) -> Self {
        Self {
            description: description.into(),
            hresult: Some(hresult),
        }
    }

    /// Classify this failure.
    pub fn kind(&self) -> AutomationFailureKind {
        self.hresult
            .map(AutomationFailureKind::from_hresult)
            .unwrap_or(AutomationFailureKind::Other)
    }
}

impl fmt::Display for AutomationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)?;
        if let Some(code) = self.hresult {
            write!(f, " (HRESULT: 0x{:08X})", code as u32)?;
        }
        if let Some(hint) = self.kind().hint() {
            write!(f, ". Possible cause: {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for AutomationError {}

/// Factory for application instances. Shared by all workers of a batch.
pub trait DocumentConverter: Send + Sync {
    /// One running copy of the application. Created, used and released on a
    /// single worker thread, so it does not need to be `Send`.
    type Instance: AutomationInstance;

    /// Launch a new, isolated application instance.
    fn create_instance(&self) -> Result<Self::Instance, AutomationError>;
}

/// A running application instance owned by one worker.
pub trait AutomationInstance {
    type Document: AutomationDocument;

    /// Open a source document.
    fn open(&mut self, path: &Path, options: &OpenOptions)
        -> Result<Self::Document, AutomationError>;

    /// Quit the application and release it.
    fn release(self) -> Result<(), AutomationError>;
}

/// A document opened by an [`AutomationInstance`].
pub trait AutomationDocument {
    /// Save the document in PDF form at `path`.
    fn save_as_pdf(&mut self, path: &Path) -> Result<(), AutomationError>;

    /// Close the document. With `discard_changes` the source is left untouched.
    fn close(self, discard_changes: bool) -> Result<(), AutomationError>;
}
