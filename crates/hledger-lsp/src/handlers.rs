//! Feature request handlers.
//!
//! Every handler is total: missing documents, unknown positions and
//! disabled features come back as empty results, never protocol errors.

use crate::params;
use crate::server::LspServer;
use crate::state::settings::Settings;
use hledger_analysis::AnalysisResult;
use hledger_code_actions::OsSubprocessRuntime;
use hledger_completion::{complete, CompletionRequest};
use hledger_formatting::{format_document, on_type};
use hledger_navigation::{
    definition, document_links, document_symbols, element_at, folding_ranges, hover, references,
    span_to_range, workspace_symbols, Element,
};
use hledger_protocol::JsonRpcError;
use hledger_resolve::{canonical_path, ResolvedJournal};
use hledger_workspace::{uri_to_path, Document};
use lsp_types::{Hover, HoverContents, Location, MarkupContent, MarkupKind, Url};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

type HandlerResult = Result<Value, JsonRpcError>;

/// Everything a positional request needs.
struct RequestContext {
    document: Document,
    path: PathBuf,
    resolved: Arc<ResolvedJournal>,
    analysis: Arc<AnalysisResult>,
}

impl LspServer {
    fn request_context(&self, request_params: &Value) -> Option<RequestContext> {
        let uri = params::uri(request_params)?;
        let document = self.documents.get(&uri)?;
        let path = canonical_path(document.path.as_deref()?);
        let (resolved, analysis) = self.workspace.write().analysis_for(&path);
        Some(RequestContext { document, path, resolved, analysis })
    }

    fn element_under_cursor(
        &self,
        context: &RequestContext,
        request_params: &Value,
    ) -> Option<Element> {
        let (line, character) = params::position(request_params)?;
        let byte = context.document.line_index.position_to_offset(
            &context.document.text,
            line,
            character,
        );
        let journal = context.resolved.files.get(&context.path)?;
        element_at(journal, byte)
    }

    fn settings_snapshot(&self) -> Settings {
        self.settings.read().clone()
    }

    pub(crate) fn handle_completion(&self, request_params: &Value) -> HandlerResult {
        let settings = self.settings_snapshot();
        let empty = json!({ "isIncomplete": true, "items": [] });
        if !settings.features.completion {
            return Ok(empty);
        }
        let Some(context) = self.request_context(request_params) else {
            return Ok(empty);
        };
        let Some((line, character)) = params::position(request_params) else {
            return Ok(empty);
        };
        let request = CompletionRequest {
            text: &context.document.text,
            line_index: &context.document.line_index,
            line,
            character,
            trigger_character: params::trigger_character(request_params),
            snippet_support: self.snippet_support && settings.completion.snippets,
            max_results: settings.completion.max_results,
            fuzzy_matching: settings.completion.fuzzy_matching,
            show_counts: settings.completion.show_counts,
            today: chrono::Local::now().date_naive(),
        };
        let list = complete(&request, &context.analysis);
        to_value(&list)
    }

    pub(crate) fn handle_hover(&self, request_params: &Value) -> HandlerResult {
        if !self.settings.read().features.hover {
            return Ok(Value::Null);
        }
        let Some(context) = self.request_context(request_params) else {
            return Ok(Value::Null);
        };
        let Some(element) = self.element_under_cursor(&context, request_params) else {
            return Ok(Value::Null);
        };
        let Some(markdown) = hover(&context.resolved, &context.analysis, &element) else {
            return Ok(Value::Null);
        };
        let span = match &element {
            Element::Account { span, .. }
            | Element::Commodity { span, .. }
            | Element::Payee { span, .. }
            | Element::TagName { span, .. }
            | Element::TagValue { span, .. }
            | Element::Amount { span, .. } => *span,
        };
        to_value(&Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: markdown,
            }),
            range: Some(span_to_range(span)),
        })
    }

    pub(crate) fn handle_definition(&self, request_params: &Value) -> HandlerResult {
        let Some(context) = self.request_context(request_params) else {
            return Ok(Value::Null);
        };
        let Some(element) = self.element_under_cursor(&context, request_params) else {
            return Ok(Value::Null);
        };
        let Some((path, span)) = definition(&context.resolved, &element) else {
            return Ok(Value::Null);
        };
        let Ok(uri) = Url::from_file_path(&path) else {
            return Ok(Value::Null);
        };
        to_value(&Location { uri, range: span_to_range(span) })
    }

    pub(crate) fn handle_references(&self, request_params: &Value) -> HandlerResult {
        let Some(context) = self.request_context(request_params) else {
            return Ok(json!([]));
        };
        let Some(element) = self.element_under_cursor(&context, request_params) else {
            return Ok(json!([]));
        };
        let include_declaration =
            params::bool_at(request_params, "/context/includeDeclaration").unwrap_or(false);
        let locations: Vec<Location> = references(&context.resolved, &element, include_declaration)
            .into_iter()
            .filter_map(|(path, span)| {
                Some(Location {
                    uri: Url::from_file_path(&path).ok()?,
                    range: span_to_range(span),
                })
            })
            .collect();
        to_value(&locations)
    }

    pub(crate) fn handle_rename(&self, request_params: &Value) -> HandlerResult {
        let Some(new_name) = params::string_field(request_params, "newName") else {
            return Err(JsonRpcError::invalid_params("rename requires newName"));
        };
        let Some(context) = self.request_context(request_params) else {
            return Ok(Value::Null);
        };
        let Some((line, character)) = params::position(request_params) else {
            return Ok(Value::Null);
        };
        let byte = context.document.line_index.position_to_offset(
            &context.document.text,
            line,
            character,
        );
        match hledger_rename::rename(&context.resolved, &context.path, byte, &new_name) {
            Some(edit) => to_value(&edit),
            None => Ok(Value::Null),
        }
    }

    pub(crate) fn handle_prepare_rename(&self, request_params: &Value) -> HandlerResult {
        let Some(context) = self.request_context(request_params) else {
            return Ok(Value::Null);
        };
        let Some((line, character)) = params::position(request_params) else {
            return Ok(Value::Null);
        };
        let byte = context.document.line_index.position_to_offset(
            &context.document.text,
            line,
            character,
        );
        match hledger_rename::prepare_rename(&context.resolved, &context.path, byte) {
            Some(range) => to_value(&range),
            None => Ok(Value::Null),
        }
    }

    pub(crate) fn handle_document_symbol(&self, request_params: &Value) -> HandlerResult {
        let Some(context) = self.request_context(request_params) else {
            return Ok(json!([]));
        };
        match context.resolved.files.get(&context.path) {
            Some(journal) => to_value(&document_symbols(journal)),
            None => Ok(json!([])),
        }
    }

    pub(crate) fn handle_workspace_symbol(&self, request_params: &Value) -> HandlerResult {
        if !self.settings.read().features.workspace_symbol {
            return Ok(json!([]));
        }
        let query = params::string_field(request_params, "query").unwrap_or_default();
        let Some((resolved, _)) = self.workspace.write().primary_analysis() else {
            return Ok(json!([]));
        };
        to_value(&workspace_symbols(&resolved, &query))
    }

    pub(crate) fn handle_document_link(&self, request_params: &Value) -> HandlerResult {
        if !self.settings.read().features.document_links {
            return Ok(json!([]));
        }
        let Some(context) = self.request_context(request_params) else {
            return Ok(json!([]));
        };
        match context.resolved.files.get(&context.path) {
            Some(journal) => to_value(&document_links(journal, &context.path)),
            None => Ok(json!([])),
        }
    }

    pub(crate) fn handle_folding_range(&self, request_params: &Value) -> HandlerResult {
        if !self.settings.read().features.folding_ranges {
            return Ok(json!([]));
        }
        let Some(context) = self.request_context(request_params) else {
            return Ok(json!([]));
        };
        match context.resolved.files.get(&context.path) {
            Some(journal) => to_value(&folding_ranges(journal)),
            None => Ok(json!([])),
        }
    }

    pub(crate) fn handle_code_action(&self, request_params: &Value) -> HandlerResult {
        let settings = self.settings_snapshot();
        if !settings.features.code_actions {
            return Ok(json!([]));
        }
        let Some(uri) = params::uri(request_params) else {
            return Ok(json!([]));
        };
        to_value(&hledger_code_actions::available_actions(&uri, &settings.cli))
    }

    pub(crate) fn handle_execute_command(&self, request_params: &Value) -> HandlerResult {
        let command = params::string_field(request_params, "command").unwrap_or_default();
        if command != hledger_protocol::methods::RUN_COMMAND {
            return Err(JsonRpcError::invalid_params(format!("unknown command `{command}`")));
        }
        let arguments = request_params
            .get("arguments")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let report = arguments.first().and_then(Value::as_str).unwrap_or_default().to_string();
        let Some(file) = arguments
            .get(1)
            .and_then(Value::as_str)
            .and_then(uri_to_path)
        else {
            return Err(JsonRpcError::invalid_params("hledger.run requires a file URI"));
        };

        let settings = self.settings_snapshot();
        let output = hledger_code_actions::run_report(
            &OsSubprocessRuntime,
            &settings.cli,
            &report,
            &file,
        );
        Ok(Value::String(output))
    }

    pub(crate) fn handle_formatting(&self, request_params: &Value) -> HandlerResult {
        let settings = self.settings_snapshot();
        if !settings.features.formatting {
            return Ok(json!([]));
        }
        let Some(context) = self.request_context(request_params) else {
            return Ok(json!([]));
        };
        let Some(journal) = context.resolved.files.get(&context.path) else {
            return Ok(json!([]));
        };
        let edits = format_document(
            &context.document.text,
            journal,
            &context.analysis.commodity_formats,
            &settings.formatting,
        );
        to_value(&edits)
    }

    pub(crate) fn handle_on_type_formatting(&self, request_params: &Value) -> HandlerResult {
        let settings = self.settings_snapshot();
        if !settings.features.formatting {
            return Ok(json!([]));
        }
        let Some(context) = self.request_context(request_params) else {
            return Ok(json!([]));
        };
        let Some((line, character)) = params::position(request_params) else {
            return Ok(json!([]));
        };
        let typed = params::string_field(request_params, "ch").unwrap_or_default();
        let Some(journal) = context.resolved.files.get(&context.path) else {
            return Ok(json!([]));
        };
        let edits = on_type(
            &context.document.text,
            journal,
            line,
            character,
            &typed,
            &settings.formatting,
        );
        to_value(&edits)
    }

    pub(crate) fn handle_semantic_tokens_full(&self, request_params: &Value) -> HandlerResult {
        if !self.settings.read().features.semantic_tokens {
            return Ok(Value::Null);
        }
        let Some(uri) = params::uri(request_params) else {
            return Ok(Value::Null);
        };
        let Some(context) = self.request_context(request_params) else {
            return Ok(Value::Null);
        };
        match context.resolved.files.get(&context.path) {
            Some(journal) => to_value(&self.token_cache.full(&uri, journal)),
            None => Ok(Value::Null),
        }
    }

    pub(crate) fn handle_semantic_tokens_delta(&self, request_params: &Value) -> HandlerResult {
        if !self.settings.read().features.semantic_tokens {
            return Ok(Value::Null);
        }
        let Some(uri) = params::uri(request_params) else {
            return Ok(Value::Null);
        };
        let previous =
            params::string_field(request_params, "previousResultId").unwrap_or_default();
        let Some(context) = self.request_context(request_params) else {
            return Ok(Value::Null);
        };
        let Some(journal) = context.resolved.files.get(&context.path) else {
            return Ok(Value::Null);
        };
        match self.token_cache.full_delta(&uri, journal, &previous) {
            Ok(delta) => to_value(&delta),
            Err(full) => to_value(&full),
        }
    }

    pub(crate) fn handle_semantic_tokens_range(&self, request_params: &Value) -> HandlerResult {
        if !self.settings.read().features.semantic_tokens {
            return Ok(Value::Null);
        }
        let Some(context) = self.request_context(request_params) else {
            return Ok(Value::Null);
        };
        let Some(((start_line, start_char), (end_line, end_char))) =
            params::range(request_params)
        else {
            return Ok(Value::Null);
        };
        let range = lsp_types::Range {
            start: lsp_types::Position { line: start_line, character: start_char },
            end: lsp_types::Position { line: end_line, character: end_char },
        };
        match context.resolved.files.get(&context.path) {
            Some(journal) => to_value(&self.token_cache.range(journal, &range)),
            None => Ok(Value::Null),
        }
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> HandlerResult {
    serde_json::to_value(value).map_err(|err| {
        JsonRpcError::new(
            hledger_protocol::error_codes::INTERNAL_ERROR,
            format!("serialization failed: {err}"),
        )
    })
}
