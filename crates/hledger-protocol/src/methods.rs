//! LSP method names served by this server.

/// `initialize`
pub const INITIALIZE: &str = "initialize";
/// `initialized`
pub const INITIALIZED: &str = "initialized";
/// `shutdown`
pub const SHUTDOWN: &str = "shutdown";
/// `exit`
pub const EXIT: &str = "exit";
/// `$/cancelRequest`
pub const CANCEL_REQUEST: &str = "$/cancelRequest";

/// `textDocument/didOpen`
pub const DID_OPEN: &str = "textDocument/didOpen";
/// `textDocument/didChange`
pub const DID_CHANGE: &str = "textDocument/didChange";
/// `textDocument/didClose`
pub const DID_CLOSE: &str = "textDocument/didClose";
/// `textDocument/didSave`
pub const DID_SAVE: &str = "textDocument/didSave";

/// `textDocument/completion`
pub const COMPLETION: &str = "textDocument/completion";
/// `textDocument/hover`
pub const HOVER: &str = "textDocument/hover";
/// `textDocument/definition`
pub const DEFINITION: &str = "textDocument/definition";
/// `textDocument/references`
pub const REFERENCES: &str = "textDocument/references";
/// `textDocument/rename`
pub const RENAME: &str = "textDocument/rename";
/// `textDocument/prepareRename`
pub const PREPARE_RENAME: &str = "textDocument/prepareRename";
/// `textDocument/documentSymbol`
pub const DOCUMENT_SYMBOL: &str = "textDocument/documentSymbol";
/// `textDocument/documentLink`
pub const DOCUMENT_LINK: &str = "textDocument/documentLink";
/// `textDocument/foldingRange`
pub const FOLDING_RANGE: &str = "textDocument/foldingRange";
/// `textDocument/codeAction`
pub const CODE_ACTION: &str = "textDocument/codeAction";
/// `textDocument/onTypeFormatting`
pub const ON_TYPE_FORMATTING: &str = "textDocument/onTypeFormatting";
/// `textDocument/formatting`
pub const FORMATTING: &str = "textDocument/formatting";
/// `textDocument/semanticTokens/full`
pub const SEMANTIC_TOKENS_FULL: &str = "textDocument/semanticTokens/full";
/// `textDocument/semanticTokens/range`
pub const SEMANTIC_TOKENS_RANGE: &str = "textDocument/semanticTokens/range";
/// `textDocument/semanticTokens/full/delta`
pub const SEMANTIC_TOKENS_FULL_DELTA: &str = "textDocument/semanticTokens/full/delta";
/// `textDocument/publishDiagnostics`
pub const PUBLISH_DIAGNOSTICS: &str = "textDocument/publishDiagnostics";

/// `workspace/symbol`
pub const WORKSPACE_SYMBOL: &str = "workspace/symbol";
/// `workspace/didChangeConfiguration`
pub const DID_CHANGE_CONFIGURATION: &str = "workspace/didChangeConfiguration";
/// `workspace/executeCommand`
pub const EXECUTE_COMMAND: &str = "workspace/executeCommand";

/// The single command served via `workspace/executeCommand`.
pub const RUN_COMMAND: &str = "hledger.run";
