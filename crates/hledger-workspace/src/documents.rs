//! Document store for in-memory text content of open editor documents.
//!
//! Tracks the current text and version per URI without touching the
//! filesystem. LSP guarantees a single writer per document; the store
//! only needs per-entry overwrite semantics under a reader-writer lock.

use hledger_position::LineIndex;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An open document.
#[derive(Debug, Clone)]
pub struct Document {
    /// The document URI as sent by the client
    pub uri: String,
    /// Filesystem path, when the URI maps to one
    pub path: Option<PathBuf>,
    /// LSP version number
    pub version: i32,
    /// Full text content
    pub text: String,
    /// Line index over `text`
    pub line_index: Arc<LineIndex>,
}

impl Document {
    fn new(uri: String, version: i32, text: String) -> Self {
        let path = crate::uri::uri_to_path(&uri);
        let line_index = Arc::new(LineIndex::new(&text));
        Document { uri, path, version, text, line_index }
    }
}

/// Thread-safe store of open documents, keyed by URI.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Arc<RwLock<FxHashMap<String, Document>>>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document, replacing any previous entry for the URI.
    pub fn open(&self, uri: String, version: i32, text: String) {
        let doc = Document::new(uri.clone(), version, text);
        self.documents.write().insert(uri, doc);
    }

    /// Replace a document's content. Returns false when the URI is not
    /// open.
    pub fn update(&self, uri: &str, version: i32, text: String) -> bool {
        let mut documents = self.documents.write();
        match documents.get_mut(uri) {
            Some(doc) => {
                doc.version = version;
                doc.line_index = Arc::new(LineIndex::new(&text));
                doc.text = text;
                true
            }
            None => false,
        }
    }

    /// Drop a document. Returns false when the URI was not open.
    pub fn close(&self, uri: &str) -> bool {
        self.documents.write().remove(uri).is_some()
    }

    /// Get a snapshot of a document.
    pub fn get(&self, uri: &str) -> Option<Document> {
        self.documents.read().get(uri).cloned()
    }

    /// Get a document's text.
    pub fn text(&self, uri: &str) -> Option<String> {
        self.documents.read().get(uri).map(|d| d.text.clone())
    }

    /// Find the open document mirroring `path`, if any.
    pub fn get_by_path(&self, path: &Path) -> Option<Document> {
        self.documents.read().values().find(|d| d.path.as_deref() == Some(path)).cloned()
    }

    /// True when the URI is open.
    pub fn is_open(&self, uri: &str) -> bool {
        self.documents.read().contains_key(uri)
    }

    /// Number of open documents.
    pub fn count(&self) -> usize {
        self.documents.read().len()
    }

    /// URIs of all open documents.
    pub fn open_uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.documents.read().keys().cloned().collect();
        uris.sort();
        uris
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn open_update_close() {
        let store = DocumentStore::new();
        store.open("file:///t/a.journal".to_string(), 1, "one\n".to_string());
        assert!(store.is_open("file:///t/a.journal"));
        assert_eq!(store.text("file:///t/a.journal"), Some("one\n".to_string()));

        assert!(store.update("file:///t/a.journal", 2, "two\n".to_string()));
        let doc = store.get("file:///t/a.journal");
        assert_eq!(doc.as_ref().map(|d| d.version), Some(2));
        assert_eq!(doc.map(|d| d.text), Some("two\n".to_string()));

        assert!(store.close("file:///t/a.journal"));
        assert!(!store.is_open("file:///t/a.journal"));
        assert!(!store.update("file:///t/a.journal", 3, "three\n".to_string()));
    }

    #[test]
    fn lookup_by_path() {
        let store = DocumentStore::new();
        store.open("file:///t/a.journal".to_string(), 1, String::new());
        let doc = store.get_by_path(Path::new("/t/a.journal"));
        assert_eq!(doc.map(|d| d.uri), Some("file:///t/a.journal".to_string()));
    }
}
