//! Load errors produced during include resolution.

use hledger_position::Span;
use std::path::PathBuf;

/// Why a file could not be loaded into the resolved journal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadErrorKind {
    /// The file does not exist or could not be read
    #[error("file not found")]
    FileNotFound,
    /// The file exceeds the configured size limit
    #[error("file is {size} bytes, over the {limit} byte limit")]
    FileTooLarge {
        /// Actual size in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },
    /// The file is not valid UTF-8
    #[error("file is not valid UTF-8")]
    EncodingError,
    /// Following this include would re-enter a file already being resolved
    #[error("include cycle detected")]
    CycleDetected,
    /// The include chain is deeper than the configured limit
    #[error("include depth exceeds the limit of {0}")]
    TooDeep(usize),
}

/// The include directive an error is anchored to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSite {
    /// File containing the include directive
    pub path: PathBuf,
    /// Span of the directive's path argument
    pub span: Span,
}

/// A failure to load one file; the traversal continues at siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    /// What went wrong
    pub kind: LoadErrorKind,
    /// The file that failed to load
    pub path: PathBuf,
    /// The include directive that referenced it; `None` for the root file
    pub site: Option<IncludeSite>,
}

impl LoadError {
    /// Human-readable message naming the target file.
    pub fn message(&self) -> String {
        format!("{}: {}", self.path.display(), self.kind)
    }
}
