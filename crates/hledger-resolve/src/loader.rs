//! File loading abstraction.
//!
//! The resolver consumes `(path, text)` pairs through this trait so the
//! language server can layer open-editor buffers over the filesystem and
//! tests can run against in-memory files.

use std::io;
use std::path::Path;

/// How a loader failed to produce text for a path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadFailure {
    /// The file does not exist
    #[error("file not found")]
    NotFound,
    /// The file exists but is not valid UTF-8
    #[error("file is not valid UTF-8")]
    Encoding,
    /// Any other I/O failure
    #[error("{0}")]
    Io(String),
}

/// Source of file contents for the resolver.
pub trait FileLoader: Send + Sync {
    /// Read the full contents of `path` as UTF-8 text.
    fn load(&self, path: &Path) -> Result<String, LoadFailure>;
}

/// Loader reading straight from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileLoader;

impl FileLoader for OsFileLoader {
    fn load(&self, path: &Path) -> Result<String, LoadFailure> {
        match std::fs::read(path) {
            Ok(bytes) => String::from_utf8(bytes).map_err(|_| LoadFailure::Encoding),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(LoadFailure::NotFound),
            Err(err) => Err(LoadFailure::Io(err.to_string())),
        }
    }
}
