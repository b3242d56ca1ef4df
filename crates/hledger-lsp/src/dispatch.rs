//! Request routing.

use crate::server::LspServer;
use hledger_protocol::{
    error_codes, methods, server_capabilities, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
};
use hledger_workspace::uri_to_path;
use serde_json::{json, Value};
use std::time::Instant;

impl LspServer {
    /// Handle one request or notification. Returns `None` for
    /// notifications.
    pub fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let JsonRpcRequest { id, method, params, .. } = request;
        let params = params.unwrap_or(Value::Null);
        let started = Instant::now();

        if method == methods::CANCEL_REQUEST {
            if let Some(cancelled_id) = params.get("id") {
                self.mark_cancelled(cancelled_id);
            }
            return None;
        }

        // lifecycle gating: only initialize may arrive first
        if !self.initialized && method != methods::INITIALIZE {
            return id.map(|id| {
                JsonRpcResponse::error(
                    Some(id),
                    JsonRpcError::new(
                        error_codes::SERVER_NOT_INITIALIZED,
                        "server is not initialized",
                    ),
                )
            });
        }

        let response = match method.as_str() {
            methods::INITIALIZE => {
                let result = self.handle_initialize(&params);
                id.map(|id| JsonRpcResponse::success(Some(id), result))
            }
            methods::INITIALIZED => {
                self.workspace.write().rescan();
                None
            }
            methods::SHUTDOWN => {
                self.shutdown_requested = true;
                id.map(|id| JsonRpcResponse::null(Some(id)))
            }
            methods::DID_OPEN => {
                self.handle_did_open(&params);
                None
            }
            methods::DID_CHANGE => {
                self.handle_did_change(&params);
                None
            }
            methods::DID_CLOSE => {
                self.handle_did_close(&params);
                None
            }
            methods::DID_SAVE => {
                self.handle_did_save(&params);
                None
            }
            methods::DID_CHANGE_CONFIGURATION => {
                self.handle_did_change_configuration(&params);
                None
            }
            _ => self.dispatch_request(id, &method, &params),
        };

        tracing::debug!(%method, elapsed_ms = started.elapsed().as_millis() as u64, "handled");
        response
    }

    /// Requests that carry an id and produce a result.
    fn dispatch_request(
        &mut self,
        id: Option<Value>,
        method: &str,
        params: &Value,
    ) -> Option<JsonRpcResponse> {
        let id = match id {
            Some(id) => id,
            // an unknown notification ("$/..." or otherwise) is ignored
            None => return None,
        };

        // coarse cancellation checkpoint before any work
        if self.is_cancelled(Some(&id)) {
            self.finish_request(Some(&id));
            return Some(JsonRpcResponse::error(
                Some(id),
                JsonRpcError::new(error_codes::REQUEST_CANCELLED, "request cancelled"),
            ));
        }

        let result = match method {
            methods::COMPLETION => self.handle_completion(params),
            methods::HOVER => self.handle_hover(params),
            methods::DEFINITION => self.handle_definition(params),
            methods::REFERENCES => self.handle_references(params),
            methods::RENAME => self.handle_rename(params),
            methods::PREPARE_RENAME => self.handle_prepare_rename(params),
            methods::DOCUMENT_SYMBOL => self.handle_document_symbol(params),
            methods::DOCUMENT_LINK => self.handle_document_link(params),
            methods::FOLDING_RANGE => self.handle_folding_range(params),
            methods::CODE_ACTION => self.handle_code_action(params),
            methods::EXECUTE_COMMAND => self.handle_execute_command(params),
            methods::FORMATTING => self.handle_formatting(params),
            methods::ON_TYPE_FORMATTING => self.handle_on_type_formatting(params),
            methods::SEMANTIC_TOKENS_FULL => self.handle_semantic_tokens_full(params),
            methods::SEMANTIC_TOKENS_RANGE => self.handle_semantic_tokens_range(params),
            methods::SEMANTIC_TOKENS_FULL_DELTA => self.handle_semantic_tokens_delta(params),
            methods::WORKSPACE_SYMBOL => self.handle_workspace_symbol(params),
            other => Err(JsonRpcError::method_not_found(other)),
        };

        // second checkpoint: a response for a cancelled request is dropped
        let cancelled = self.is_cancelled(Some(&id));
        self.finish_request(Some(&id));
        if cancelled {
            return Some(JsonRpcResponse::error(
                Some(id),
                JsonRpcError::new(error_codes::REQUEST_CANCELLED, "request cancelled"),
            ));
        }

        Some(match result {
            Ok(value) => JsonRpcResponse::success(Some(id), value),
            Err(error) => JsonRpcResponse::error(Some(id), error),
        })
    }

    fn handle_initialize(&mut self, params: &Value) -> Value {
        self.initialized = true;
        self.snippet_support = params
            .pointer("/capabilities/textDocument/completion/completionItem/snippetSupport")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if let Some(settings) = params.get("initializationOptions") {
            self.settings.write().update_from_value(settings);
        }

        // prefer rootUri, then the first workspace folder, then rootPath
        let root = params
            .pointer("/rootUri")
            .and_then(Value::as_str)
            .and_then(uri_to_path)
            .or_else(|| {
                params
                    .pointer("/workspaceFolders/0/uri")
                    .and_then(Value::as_str)
                    .and_then(uri_to_path)
            })
            .or_else(|| {
                params
                    .pointer("/rootPath")
                    .and_then(Value::as_str)
                    .map(std::path::PathBuf::from)
            });
        if let Some(root) = root {
            tracing::info!(root = %root.display(), "workspace root");
            self.workspace.write().set_root_dir(root);
        }

        let toggles = self.settings.read().feature_toggles();
        json!({
            "capabilities": server_capabilities(&toggles),
            "serverInfo": {
                "name": "hledger-lsp",
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    fn handle_did_change_configuration(&mut self, params: &Value) {
        if let Some(settings) = params.get("settings") {
            self.settings.write().update_from_value(settings);
            let limits = self.settings.read().limits.clone();
            self.workspace.write().set_config(limits);
            self.token_cache.clear();
            for uri in self.documents.open_uris() {
                let version = self.documents.get(&uri).map(|d| d.version);
                self.publisher.schedule(uri, version);
            }
        }
    }
}
