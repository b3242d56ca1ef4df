//! End-to-end server tests, driving `handle_request` the way the
//! transport would.

use hledger_lsp::LspServer;
use hledger_protocol::{JsonRpcRequest, JsonRpcResponse};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Output sink capturing everything the server writes.
#[derive(Clone, Default)]
struct Sink(Arc<Mutex<Vec<u8>>>);

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Sink {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).to_string()
    }

    fn wait_for(&self, needle: &str) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if self.contents().contains(needle) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }
}

fn new_server(root: &Path) -> (LspServer, Sink) {
    let sink = Sink::default();
    let server = LspServer::with_writer(root.to_path_buf(), Box::new(sink.clone()));
    (server, sink)
}

fn request(
    server: &mut LspServer,
    id: i64,
    method: &str,
    params: Value,
) -> Option<JsonRpcResponse> {
    server.handle_request(JsonRpcRequest {
        _jsonrpc: "2.0".to_string(),
        id: Some(json!(id)),
        method: method.to_string(),
        params: Some(params),
    })
}

fn notify(server: &mut LspServer, method: &str, params: Value) {
    let response = server.handle_request(JsonRpcRequest {
        _jsonrpc: "2.0".to_string(),
        id: None,
        method: method.to_string(),
        params: Some(params),
    });
    assert!(response.is_none(), "notifications never get responses");
}

fn initialize(server: &mut LspServer) -> Value {
    let response = request(
        server,
        1,
        "initialize",
        json!({
            "capabilities": {
                "textDocument": {
                    "completion": {"completionItem": {"snippetSupport": true}}
                }
            }
        }),
    );
    response.and_then(|r| r.result).unwrap_or(Value::Null)
}

fn open(server: &mut LspServer, uri: &str, text: &str) {
    notify(
        server,
        "textDocument/didOpen",
        json!({
            "textDocument": {
                "uri": uri,
                "languageId": "hledger",
                "version": 1,
                "text": text,
            }
        }),
    );
}

fn result_of(response: Option<JsonRpcResponse>) -> Value {
    response.and_then(|r| r.result).unwrap_or(Value::Null)
}

const S1_JOURNAL: &str = "\
2024-01-01 a\n    expenses:food  1 EUR\n    assets:cash\n\
2024-01-02 b\n    expenses:food  1 EUR\n    assets:cash\n\
2024-01-03 c\n    expenses:food  1 EUR\n    assets:cash\n\
2024-01-04 d\n    expenses:rare  1 EUR\n    assets:cash\n";

#[test]
fn initialize_advertises_capabilities() {
    let Some(dir) = tempfile::tempdir().ok() else { return };
    let (mut server, _sink) = new_server(dir.path());
    let result = initialize(&mut server);
    assert_eq!(
        result.pointer("/capabilities/completionProvider/triggerCharacters"),
        Some(&json!([":", "@", "="]))
    );
    assert_eq!(result.pointer("/serverInfo/name"), Some(&json!("hledger-lsp")));
    assert!(result.pointer("/capabilities/semanticTokensProvider").is_some());
}

#[test]
fn requests_before_initialize_are_rejected() {
    let Some(dir) = tempfile::tempdir().ok() else { return };
    let (mut server, _sink) = new_server(dir.path());
    let response = request(&mut server, 1, "textDocument/completion", json!({}));
    let code = response.and_then(|r| r.error).map(|e| e.code);
    assert_eq!(code, Some(-32002));
}

#[test]
fn unknown_method_is_method_not_found() {
    let Some(dir) = tempfile::tempdir().ok() else { return };
    let (mut server, _sink) = new_server(dir.path());
    initialize(&mut server);
    let response = request(&mut server, 2, "textDocument/typeHierarchy", json!({}));
    let code = response.and_then(|r| r.error).map(|e| e.code);
    assert_eq!(code, Some(-32601));
}

#[test]
fn account_completion_ranks_by_frequency() {
    let Some(dir) = tempfile::tempdir().ok() else { return };
    let (mut server, _sink) = new_server(dir.path());
    initialize(&mut server);

    let uri = "file:///virtual/main.journal";
    let text = format!("{S1_JOURNAL}2024-01-05 x\n    \n");
    open(&mut server, uri, &text);

    let result = result_of(request(
        &mut server,
        2,
        "textDocument/completion",
        json!({
            "textDocument": {"uri": uri},
            "position": {"line": 13, "character": 4},
        }),
    ));

    assert_eq!(result.get("isIncomplete"), Some(&json!(true)));
    let items = result.get("items").and_then(Value::as_array).cloned().unwrap_or_default();
    assert!(!items.is_empty());
    let labels: Vec<&str> = items.iter().filter_map(|i| i.get("label")?.as_str()).collect();
    let food = labels.iter().position(|l| *l == "expenses:food");
    let rare = labels.iter().position(|l| *l == "expenses:rare");
    assert!(food.is_some() && food < rare, "labels: {labels:?}");

    // sort_text orders the same way, and filter_text is shared
    let sort_of = |label: &str| {
        items
            .iter()
            .find(|i| i.get("label").and_then(Value::as_str) == Some(label))
            .and_then(|i| i.get("sortText"))
            .and_then(Value::as_str)
            .map(str::to_owned)
    };
    assert!(sort_of("expenses:food") < sort_of("expenses:rare"));
    let filters: Vec<&Value> = items.iter().filter_map(|i| i.get("filterText")).collect();
    assert!(filters.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn utf16_edit_is_applied_exactly() {
    let Some(dir) = tempfile::tempdir().ok() else { return };
    let (mut server, _sink) = new_server(dir.path());
    initialize(&mut server);

    let uri = "file:///virtual/ru.journal";
    open(&mut server, uri, "2024-01-01 x\n    Активы:Кошелек  100 RUB\n    Доходы\n");

    // replace "Кошелек" (UTF-16 characters [11, 18) on line 1) with "Банк"
    notify(
        &mut server,
        "textDocument/didChange",
        json!({
            "textDocument": {"uri": uri, "version": 2},
            "contentChanges": [{
                "range": {
                    "start": {"line": 1, "character": 11},
                    "end": {"line": 1, "character": 18},
                },
                "text": "Банк",
            }],
        }),
    );

    let hover = result_of(request(
        &mut server,
        3,
        "textDocument/hover",
        json!({
            "textDocument": {"uri": uri},
            "position": {"line": 1, "character": 12},
        }),
    ));
    let markdown = hover.pointer("/contents/value").and_then(Value::as_str).unwrap_or("");
    assert!(markdown.contains("Активы:Банк"), "got: {markdown}");
}

#[test]
fn hover_aggregates_across_includes() {
    let Some(dir) = tempfile::tempdir().ok() else { return };
    let main_path = dir.path().join("main.journal");
    let data_path = dir.path().join("data.journal");
    let main_text = "include data.journal\n2024-01-04 m\n    expenses:food  1.00 EUR\n    assets:cash\n";
    if std::fs::write(&main_path, main_text).is_err() {
        return;
    }
    let data_text = "2024-01-01 a\n    expenses:food  2.00 EUR\n    assets:cash\n\
2024-01-02 b\n    expenses:food  3.00 EUR\n    assets:cash\n\
2024-01-03 c\n    expenses:food  4.00 EUR\n    assets:cash\n";
    if std::fs::write(&data_path, data_text).is_err() {
        return;
    }

    let (mut server, _sink) = new_server(dir.path());
    initialize(&mut server);
    let Some(uri) = url::Url::from_file_path(&main_path).ok() else { return };
    open(&mut server, uri.as_str(), main_text);

    let hover = result_of(request(
        &mut server,
        4,
        "textDocument/hover",
        json!({
            "textDocument": {"uri": uri.as_str()},
            "position": {"line": 2, "character": 8},
        }),
    ));
    let markdown = hover.pointer("/contents/value").and_then(Value::as_str).unwrap_or("");
    assert!(markdown.contains("Postings: 4"), "got: {markdown}");
}

#[test]
fn include_cycle_publishes_a_diagnostic_and_completion_still_works() {
    let Some(dir) = tempfile::tempdir().ok() else { return };
    let a_path = dir.path().join("a.journal");
    let b_path = dir.path().join("b.journal");
    let a_text = "account from-a\ninclude b.journal\n2024-01-05 x\n    \n";
    if std::fs::write(&a_path, a_text).is_err() {
        return;
    }
    if std::fs::write(&b_path, "account from-b\ninclude a.journal\n").is_err() {
        return;
    }

    let (mut server, sink) = new_server(dir.path());
    initialize(&mut server);
    let Some(uri) = url::Url::from_file_path(&a_path).ok() else { return };
    open(&mut server, uri.as_str(), a_text);

    assert!(sink.wait_for("CYCLE_DETECTED"), "diagnostics: {}", sink.contents());

    let result = result_of(request(
        &mut server,
        5,
        "textDocument/completion",
        json!({
            "textDocument": {"uri": uri.as_str()},
            "position": {"line": 3, "character": 4},
        }),
    ));
    let labels: Vec<&str> = result
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|i| i.get("label")?.as_str()).collect())
        .unwrap_or_default();
    assert!(labels.contains(&"from-a"), "labels: {labels:?}");
    assert!(labels.contains(&"from-b"), "labels: {labels:?}");
}

#[test]
fn on_type_newline_after_closed_posting_strips_indent() {
    let Some(dir) = tempfile::tempdir().ok() else { return };
    let (mut server, _sink) = new_server(dir.path());
    initialize(&mut server);

    let uri = "file:///virtual/ontype.journal";
    open(&mut server, uri, "2024-01-01 x\n    expenses:food  10 EUR\n    \n");

    let result = result_of(request(
        &mut server,
        6,
        "textDocument/onTypeFormatting",
        json!({
            "textDocument": {"uri": uri},
            "position": {"line": 2, "character": 4},
            "ch": "\n",
            "options": {"tabSize": 4, "insertSpaces": true},
        }),
    ));
    let edits = result.as_array().cloned().unwrap_or_default();
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].get("newText"), Some(&json!("")));
}

#[test]
fn cancelled_request_returns_the_cancellation_code() {
    let Some(dir) = tempfile::tempdir().ok() else { return };
    let (mut server, _sink) = new_server(dir.path());
    initialize(&mut server);

    notify(&mut server, "$/cancelRequest", json!({"id": 42}));
    let response = request(&mut server, 42, "textDocument/completion", json!({}));
    let code = response.and_then(|r| r.error).map(|e| e.code);
    assert_eq!(code, Some(-32800));
}

#[test]
fn unknown_execute_command_is_a_protocol_error() {
    let Some(dir) = tempfile::tempdir().ok() else { return };
    let (mut server, _sink) = new_server(dir.path());
    initialize(&mut server);
    let response = request(
        &mut server,
        7,
        "workspace/executeCommand",
        json!({"command": "hledger.selfdestruct", "arguments": []}),
    );
    let code = response.and_then(|r| r.error).map(|e| e.code);
    assert_eq!(code, Some(-32602));
}

#[test]
fn configuration_change_applies_and_clamps() {
    let Some(dir) = tempfile::tempdir().ok() else { return };
    let (mut server, _sink) = new_server(dir.path());
    initialize(&mut server);

    let uri = "file:///virtual/cfg.journal";
    let text = format!("{S1_JOURNAL}2024-01-05 x\n    \n");
    open(&mut server, uri, &text);

    notify(
        &mut server,
        "workspace/didChangeConfiguration",
        json!({"settings": {"completion": {"maxResults": 1}}}),
    );
    let result = result_of(request(
        &mut server,
        8,
        "textDocument/completion",
        json!({
            "textDocument": {"uri": uri},
            "position": {"line": 13, "character": 4},
        }),
    ));
    let items = result.get("items").and_then(Value::as_array).cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(result.get("isIncomplete"), Some(&json!(true)));
}

#[test]
fn missing_document_completion_is_silent() {
    let Some(dir) = tempfile::tempdir().ok() else { return };
    let (mut server, _sink) = new_server(dir.path());
    initialize(&mut server);
    let result = result_of(request(
        &mut server,
        9,
        "textDocument/completion",
        json!({
            "textDocument": {"uri": "file:///nowhere.journal"},
            "position": {"line": 0, "character": 0},
        }),
    ));
    assert_eq!(result.get("items"), Some(&json!([])));
}

#[test]
fn shutdown_then_exit_returns_zero() {
    let Some(dir) = tempfile::tempdir().ok() else { return };
    let (mut server, _sink) = new_server(dir.path());

    let mut stream = Vec::new();
    for body in [
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"capabilities":{}}}"#
            .to_string(),
        r#"{"jsonrpc":"2.0","id":2,"method":"shutdown"}"#.to_string(),
        r#"{"jsonrpc":"2.0","method":"exit"}"#.to_string(),
    ] {
        stream.extend_from_slice(
            format!("Content-Length: {}\r\n\r\n{}", body.len(), body).as_bytes(),
        );
    }
    let mut reader = std::io::BufReader::new(stream.as_slice());
    let code = server.run_with_reader(&mut reader).ok();
    assert_eq!(code, Some(0));
}

#[test]
fn semantic_tokens_full_then_delta() {
    let Some(dir) = tempfile::tempdir().ok() else { return };
    let (mut server, _sink) = new_server(dir.path());
    initialize(&mut server);

    let uri = "file:///virtual/tokens.journal";
    open(&mut server, uri, "2024-01-01 x\n    a  1 EUR\n    b\n");

    let full = result_of(request(
        &mut server,
        10,
        "textDocument/semanticTokens/full",
        json!({"textDocument": {"uri": uri}}),
    ));
    let data = full.get("data").and_then(Value::as_array).cloned().unwrap_or_default();
    assert!(!data.is_empty());
    assert_eq!(data.len() % 5, 0);

    let result_id = full.get("resultId").and_then(Value::as_str).unwrap_or("").to_string();
    let delta = result_of(request(
        &mut server,
        11,
        "textDocument/semanticTokens/full/delta",
        json!({"textDocument": {"uri": uri}, "previousResultId": result_id}),
    ));
    assert_eq!(delta.get("edits"), Some(&json!([])));
}
