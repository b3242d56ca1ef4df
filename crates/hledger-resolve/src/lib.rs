//! Include-graph resolution: composing a multi-file workspace into one
//! logical journal.
//!
//! `include` directives are followed depth-first with cycle detection.
//! Each file's parse is cached by canonical path and reused by reference
//! until the file changes; a reverse-include graph answers which roots a
//! change affects. Load failures become [`LoadError`]s anchored to the
//! offending include directive and never abort the traversal.

#![deny(unsafe_code)]

mod error;
mod loader;
mod paths;
mod resolver;

pub use error::{IncludeSite, LoadError, LoadErrorKind};
pub use loader::{FileLoader, LoadFailure, OsFileLoader};
pub use paths::canonical_path;
pub use resolver::{ResolveConfig, ResolvedJournal, Resolver};
