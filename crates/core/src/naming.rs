//! Output file naming rules.

use crate::error::ConversionError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::warn;

/// Name used when a rule strips everything from the input name.
pub const FALLBACK_BASE_NAME: &str = "Untitled_Document";

static RE_BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("valid bracket regex"));
static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// How the output PDF is named after its source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NamingRule {
    /// Keep the source file name.
    #[default]
    OriginalName,
    /// Drop every `[...]` span, e.g. `Report [Draft].docx` -> `Report.pdf`.
    RemoveSquareBrackets,
}

impl NamingRule {
    /// All rules, in the order a picker would list them.
    pub const ALL: [NamingRule; 2] = [NamingRule::RemoveSquareBrackets, NamingRule::OriginalName];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            NamingRule::OriginalName => "Original Name",
            NamingRule::RemoveSquareBrackets => "Remove Square Brackets",
        }
    }

    /// Parse a label, falling back to [`NamingRule::OriginalName`] with a
    /// warning when it is not recognized.
    pub fn from_label_lenient(label: &str) -> Self {
        label.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown naming rule '{}', using '{}'",
                label,
                NamingRule::OriginalName
            );
            NamingRule::OriginalName
        })
    }
}

impl fmt::Display for NamingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NamingRule {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "original name" | "original-name" | "original_name" | "originalname" => {
                Ok(NamingRule::OriginalName)
            }
            "remove square brackets"
            | "remove-square-brackets"
            | "remove_square_brackets"
            | "removesquarebrackets" => Ok(NamingRule::RemoveSquareBrackets),
            _ => Err(ConversionError::UnknownNamingRule(s.to_string())),
        }
    }
}

/// File name without directory and extension.
fn base_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Strip bracketed spans and normalize whitespace.
fn remove_square_brackets(name: &str) -> String {
    let stripped = RE_BRACKETED.replace_all(name, "");
    let collapsed = RE_WHITESPACE.replace_all(&stripped, " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        FALLBACK_BASE_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Proposed PDF file name for `input` under `rule`, before any collision
/// handling. Pure and does not touch the filesystem.
pub fn proposed_pdf_name(input: &Path, rule: NamingRule) -> String {
    let base = base_name(input);
    let base = match rule {
        NamingRule::OriginalName => base,
        NamingRule::RemoveSquareBrackets => remove_square_brackets(&base),
    };
    format!("{}.pdf", base)
}

/// Proposed names for a list of inputs, for previews before a batch starts.
pub fn preview_names(files: &[PathBuf], rule: NamingRule) -> Vec<(PathBuf, String)> {
    files
        .iter()
        .map(|f| (f.clone(), proposed_pdf_name(f, rule)))
        .collect()
}
