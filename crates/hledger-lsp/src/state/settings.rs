//! Runtime settings, updated via `workspace/didChangeConfiguration`.
//!
//! Both nested (`{"features": {"hover": true}}`) and dotted
//! (`{"features.hover": true}`) forms are accepted, with or without a
//! leading `hledger.` section prefix. Updates are validated: zero or
//! empty fields fall back to their defaults.

use hledger_code_actions::CliSettings;
use hledger_diagnostics::DiagnosticFilter;
use hledger_formatting::FormatSettings;
use hledger_protocol::FeatureToggles;
use hledger_resolve::ResolveConfig;
use serde_json::Value;
use std::time::Duration;

/// Per-feature enable switches.
#[derive(Debug, Clone)]
pub struct Features {
    /// Hover panels
    pub hover: bool,
    /// Completion
    pub completion: bool,
    /// Formatting (full document and on-type)
    pub formatting: bool,
    /// Diagnostics publication
    pub diagnostics: bool,
    /// Semantic tokens
    pub semantic_tokens: bool,
    /// Code actions
    pub code_actions: bool,
    /// Folding ranges
    pub folding_ranges: bool,
    /// Document links
    pub document_links: bool,
    /// Workspace symbol search
    pub workspace_symbol: bool,
    /// Inline completion (off by default)
    pub inline_completion: bool,
}

impl Default for Features {
    fn default() -> Self {
        Features {
            hover: true,
            completion: true,
            formatting: true,
            diagnostics: true,
            semantic_tokens: true,
            code_actions: true,
            folding_ranges: true,
            document_links: true,
            workspace_symbol: true,
            inline_completion: false,
        }
    }
}

/// Completion tuning.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    /// Result cap
    pub max_results: usize,
    /// Offer snippet templates for payees
    pub snippets: bool,
    /// Fuzzy (vs. substring) matching
    pub fuzzy_matching: bool,
    /// Show usage counts in item details
    pub show_counts: bool,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        CompletionSettings {
            max_results: 50,
            snippets: true,
            fuzzy_matching: true,
            show_counts: true,
        }
    }
}

/// All recognized settings.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Feature switches
    pub features: Features,
    /// Completion tuning
    pub completion: CompletionSettings,
    /// Diagnostic family switches
    pub diagnostics: DiagnosticFilter,
    /// Formatter configuration
    pub formatting: FormatSettings,
    /// External CLI integration
    pub cli: CliSettings,
    /// Resolver limits
    pub limits: ResolveConfig,
}

impl Settings {
    /// Apply a configuration payload, then re-validate.
    pub fn update_from_value(&mut self, value: &Value) {
        // unwrap an optional section wrapper
        let value = value
            .as_object()
            .and_then(|map| map.get("hledger").or_else(|| map.get("hledger-lsp")))
            .unwrap_or(value);
        self.flatten("", value);
        self.normalize();
    }

    fn flatten(&mut self, prefix: &str, value: &Value) {
        let Some(map) = value.as_object() else { return };
        for (key, entry) in map {
            let path =
                if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
            if entry.is_object() {
                self.flatten(&path, entry);
            } else {
                self.apply(&path, entry);
            }
        }
    }

    fn apply(&mut self, key: &str, value: &Value) {
        let set_bool = |target: &mut bool| {
            if let Some(flag) = value.as_bool() {
                *target = flag;
            }
        };
        match key {
            "features.hover" => set_bool(&mut self.features.hover),
            "features.completion" => set_bool(&mut self.features.completion),
            "features.formatting" => set_bool(&mut self.features.formatting),
            "features.diagnostics" => set_bool(&mut self.features.diagnostics),
            "features.semanticTokens" => set_bool(&mut self.features.semantic_tokens),
            "features.codeActions" => set_bool(&mut self.features.code_actions),
            "features.foldingRanges" => set_bool(&mut self.features.folding_ranges),
            "features.documentLinks" => set_bool(&mut self.features.document_links),
            "features.workspaceSymbol" => set_bool(&mut self.features.workspace_symbol),
            "features.inlineCompletion" => set_bool(&mut self.features.inline_completion),

            "completion.maxResults" => {
                if let Some(n) = value.as_u64() {
                    self.completion.max_results = n as usize;
                }
            }
            "completion.snippets" => set_bool(&mut self.completion.snippets),
            "completion.fuzzyMatching" => set_bool(&mut self.completion.fuzzy_matching),
            "completion.showCounts" => set_bool(&mut self.completion.show_counts),

            "diagnostics.undeclaredAccounts" => {
                set_bool(&mut self.diagnostics.undeclared_accounts)
            }
            "diagnostics.undeclaredCommodities" => {
                set_bool(&mut self.diagnostics.undeclared_commodities)
            }
            "diagnostics.unbalancedTransactions" => {
                set_bool(&mut self.diagnostics.unbalanced_transactions)
            }

            "formatting.indentSize" => {
                if let Some(n) = value.as_u64() {
                    self.formatting.indent_size = n as u32;
                }
            }
            "formatting.alignAmounts" => set_bool(&mut self.formatting.align_amounts),
            "formatting.minAlignmentColumn" => {
                if let Some(n) = value.as_i64() {
                    self.formatting.min_alignment_column = n.max(0) as u32;
                }
            }

            "cli.enabled" => set_bool(&mut self.cli.enabled),
            "cli.path" => {
                if let Some(path) = value.as_str() {
                    self.cli.path = path.to_string();
                }
            }
            "cli.timeout" => {
                if let Some(ms) = value.as_u64() {
                    self.cli.timeout = Duration::from_millis(ms);
                }
            }

            "limits.maxFileSizeBytes" => {
                if let Some(n) = value.as_u64() {
                    self.limits.max_file_size = n;
                }
            }
            "limits.maxIncludeDepth" => {
                if let Some(n) = value.as_u64() {
                    self.limits.max_include_depth = n as usize;
                }
            }
            _ => tracing::debug!(key, "ignoring unknown setting"),
        }
    }

    /// Restore defaults for zero/empty fields.
    fn normalize(&mut self) {
        if self.completion.max_results == 0 {
            self.completion.max_results = CompletionSettings::default().max_results;
        }
        if self.formatting.indent_size == 0 {
            self.formatting.indent_size = FormatSettings::default().indent_size;
        }
        if self.cli.path.trim().is_empty() {
            self.cli.path = CliSettings::default().path;
        }
        if self.cli.timeout.is_zero() {
            self.cli.timeout = CliSettings::default().timeout;
        }
        if self.limits.max_file_size == 0 {
            self.limits.max_file_size = ResolveConfig::default().max_file_size;
        }
        if self.limits.max_include_depth == 0 {
            self.limits.max_include_depth = ResolveConfig::default().max_include_depth;
        }
    }

    /// The capability toggles for `initialize`.
    pub fn feature_toggles(&self) -> FeatureToggles {
        FeatureToggles {
            hover: self.features.hover,
            completion: self.features.completion,
            formatting: self.features.formatting,
            semantic_tokens: self.features.semantic_tokens,
            code_actions: self.features.code_actions,
            folding_ranges: self.features.folding_ranges,
            document_links: self.features.document_links,
            workspace_symbol: self.features.workspace_symbol,
        }
    }
}
