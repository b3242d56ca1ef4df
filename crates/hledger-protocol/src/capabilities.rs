//! Server capability configuration.
//!
//! Single source of truth for what the server advertises during
//! `initialize`. Feature toggles come from settings; a disabled feature
//! is simply not advertised, so well-behaved clients never send it.

use crate::methods;
use lsp_types::*;

/// Which features to advertise (the `features.*` settings).
#[derive(Debug, Clone)]
pub struct FeatureToggles {
    /// Hover panels
    pub hover: bool,
    /// Completion
    pub completion: bool,
    /// Document formatting and on-type formatting
    pub formatting: bool,
    /// Semantic tokens
    pub semantic_tokens: bool,
    /// Code actions and `hledger.run`
    pub code_actions: bool,
    /// Folding ranges
    pub folding_ranges: bool,
    /// Document links
    pub document_links: bool,
    /// Workspace symbol search
    pub workspace_symbol: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        FeatureToggles {
            hover: true,
            completion: true,
            formatting: true,
            semantic_tokens: true,
            code_actions: true,
            folding_ranges: true,
            document_links: true,
            workspace_symbol: true,
        }
    }
}

/// Build the `initialize` capability set.
pub fn server_capabilities(features: &FeatureToggles) -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::INCREMENTAL),
                will_save: None,
                will_save_wait_until: None,
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(false),
                })),
            },
        )),
        completion_provider: features.completion.then(|| CompletionOptions {
            trigger_characters: Some(vec![":".into(), "@".into(), "=".into()]),
            resolve_provider: Some(false),
            ..Default::default()
        }),
        hover_provider: features.hover.then_some(HoverProviderCapability::Simple(true)),
        definition_provider: Some(OneOf::Left(true)),
        references_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        workspace_symbol_provider: features.workspace_symbol.then_some(OneOf::Left(true)),
        document_link_provider: features.document_links.then(|| DocumentLinkOptions {
            resolve_provider: Some(false),
            work_done_progress_options: Default::default(),
        }),
        folding_range_provider: features
            .folding_ranges
            .then_some(FoldingRangeProviderCapability::Simple(true)),
        code_action_provider: features
            .code_actions
            .then_some(CodeActionProviderCapability::Simple(true)),
        execute_command_provider: features.code_actions.then(|| ExecuteCommandOptions {
            commands: vec![methods::RUN_COMMAND.to_string()],
            work_done_progress_options: Default::default(),
        }),
        rename_provider: Some(OneOf::Right(RenameOptions {
            prepare_provider: Some(true),
            work_done_progress_options: Default::default(),
        })),
        document_formatting_provider: features.formatting.then_some(OneOf::Left(true)),
        document_on_type_formatting_provider: features.formatting.then(|| {
            DocumentOnTypeFormattingOptions {
                first_trigger_character: "\n".to_string(),
                more_trigger_character: Some(vec!["\t".to_string()]),
            }
        }),
        semantic_tokens_provider: features.semantic_tokens.then(|| {
            SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
                work_done_progress_options: Default::default(),
                legend: hledger_semantic_tokens::legend(),
                range: Some(true),
                full: Some(SemanticTokensFullOptions::Delta { delta: Some(true) }),
            })
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capabilities_advertise_everything() {
        let caps = server_capabilities(&FeatureToggles::default());
        assert!(caps.completion_provider.is_some());
        assert!(caps.hover_provider.is_some());
        assert!(caps.semantic_tokens_provider.is_some());
        assert!(caps.document_on_type_formatting_provider.is_some());
        let triggers = caps
            .completion_provider
            .and_then(|c| c.trigger_characters)
            .unwrap_or_default();
        assert_eq!(triggers, vec![":", "@", "="]);
    }

    #[test]
    fn disabled_features_are_not_advertised() {
        let features = FeatureToggles {
            completion: false,
            semantic_tokens: false,
            ..Default::default()
        };
        let caps = server_capabilities(&features);
        assert!(caps.completion_provider.is_none());
        assert!(caps.semantic_tokens_provider.is_none());
        assert!(caps.hover_provider.is_some());
    }
}
