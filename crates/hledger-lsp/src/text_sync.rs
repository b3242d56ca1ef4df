//! Document synchronization: didOpen / didChange / didClose / didSave.

use crate::params;
use crate::server::LspServer;
use hledger_position::apply_change;
use hledger_workspace::uri_to_path;
use serde_json::Value;

impl LspServer {
    pub(crate) fn handle_did_open(&mut self, params: &Value) {
        let Some(uri) = params::uri(params) else { return };
        let text = params
            .pointer("/textDocument/text")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let version = params
            .pointer("/textDocument/version")
            .and_then(Value::as_i64)
            .unwrap_or(0) as i32;

        tracing::debug!(%uri, version, "didOpen");
        self.documents.open(uri.clone(), version, text);
        self.invalidate(&uri);
        self.schedule_diagnostics(&uri, Some(version));
    }

    pub(crate) fn handle_did_change(&mut self, params: &Value) {
        let Some(uri) = params::uri(params) else { return };
        let Some(document) = self.documents.get(&uri) else {
            tracing::warn!(%uri, "didChange for a document that is not open");
            return;
        };
        let version = params
            .pointer("/textDocument/version")
            .and_then(Value::as_i64)
            .unwrap_or(document.version as i64 + 1) as i32;

        let mut text = document.text;
        let changes = params
            .get("contentChanges")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for change in &changes {
            let range = change_range(change);
            let replacement = change.get("text").and_then(Value::as_str).unwrap_or("");
            text = apply_change(&text, range, replacement);
        }

        self.documents.update(&uri, version, text);
        self.invalidate(&uri);
        self.schedule_diagnostics(&uri, Some(version));
    }

    pub(crate) fn handle_did_close(&mut self, params: &Value) {
        let Some(uri) = params::uri(params) else { return };
        tracing::debug!(%uri, "didClose");
        self.documents.close(&uri);
        self.token_cache.evict(&uri);
        self.invalidate(&uri);
        self.publisher.clear(uri);
    }

    pub(crate) fn handle_did_save(&mut self, params: &Value) {
        let Some(uri) = params::uri(params) else { return };
        // the file on disk changed; cached parses of the disk content are
        // stale even though the overlay text is not
        self.invalidate(&uri);
        let version = self.documents.get(&uri).map(|d| d.version);
        self.schedule_diagnostics(&uri, version);
    }

    fn invalidate(&self, uri: &str) {
        if let Some(path) = uri_to_path(uri) {
            self.workspace.write().update_file(&path);
        }
    }

    /// Publish for the changed document now, and refresh every other open
    /// document, since an edit can add or remove declarations other
    /// files use.
    pub(crate) fn schedule_diagnostics(&self, uri: &str, version: Option<i32>) {
        self.publisher.schedule(uri.to_string(), version);
        for other in self.documents.open_uris() {
            if other != uri {
                let other_version = self.documents.get(&other).map(|d| d.version);
                self.publisher.schedule(other, other_version);
            }
        }
    }
}

fn change_range(change: &Value) -> Option<((u32, u32), (u32, u32))> {
    let get = |pointer: &str| change.pointer(pointer)?.as_u64().map(|n| n as u32);
    Some((
        (get("/range/start/line")?, get("/range/start/character")?),
        (get("/range/end/line")?, get("/range/end/character")?),
    ))
}
