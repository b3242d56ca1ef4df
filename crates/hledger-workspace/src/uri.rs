//! URI ↔ filesystem path conversion.

use std::path::{Path, PathBuf};
use url::Url;

/// Convert a document URI to a filesystem path. Non-`file:` URIs and
/// unparseable strings yield `None`.
pub fn uri_to_path(uri: &str) -> Option<PathBuf> {
    let url = Url::parse(uri).ok()?;
    url.to_file_path().ok()
}

/// Convert a filesystem path to a `file:` URI string.
pub fn path_to_uri(path: &Path) -> Option<String> {
    Url::from_file_path(path).ok().map(|u| u.to_string())
}
