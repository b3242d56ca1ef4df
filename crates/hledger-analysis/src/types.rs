//! Analysis output types.

use crate::commodity_format::CommodityFormat;
use chrono::NaiveDate;
use hledger_journal::DateStyle;
use hledger_position::Span;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A name with its usage count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEntry {
    /// Entity name
    pub name: String,
    /// Number of postings (accounts) or transactions (payees, tags) that
    /// reference it
    pub count: u32,
}

/// The account completion index.
#[derive(Debug, Clone, Default)]
pub struct AccountIndex {
    /// Every account that appears, declared or used, sorted by descending
    /// usage then ascending name
    pub all: Vec<String>,
    /// Colon-terminated segment prefix → accounts sharing it, each list
    /// sorted by descending usage then ascending name
    pub by_prefix: FxHashMap<String, Vec<String>>,
    /// Usage count per account (postings across all files)
    pub counts: FxHashMap<String, u32>,
    /// Accounts with an `account` directive anywhere in the workspace
    pub declared: FxHashSet<String>,
}

/// The postings of a payee's most recent transaction, kept as a
/// completion snippet body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingTemplate {
    /// Date of the transaction the template was taken from
    pub date: NaiveDate,
    /// Template postings in source order
    pub postings: Vec<TemplatePosting>,
}

/// One line of a posting template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePosting {
    /// Account name
    pub account: String,
    /// Amount literal exactly as written, commodity position included
    pub amount: Option<String>,
}

/// Diagnostic codes, part of the contract with the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// Posting references an account with no `account` directive
    UndeclaredAccount,
    /// Amount uses a commodity with no `commodity` directive
    UndeclaredCommodity,
    /// Per-commodity sums are nonzero with no elidable posting
    Unbalanced,
    /// More than one posting in a transaction lacks an amount
    MultipleInferred,
    /// Forwarded from the parser
    ParseError,
    /// An included file could not be found
    FileNotFound,
    /// An included file exceeds the size limit
    FileTooLarge,
    /// An included file is not valid UTF-8
    EncodingError,
    /// An include cycle was detected
    CycleDetected,
}

impl DiagnosticCode {
    /// The wire string for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::UndeclaredAccount => "UNDECLARED_ACCOUNT",
            DiagnosticCode::UndeclaredCommodity => "UNDECLARED_COMMODITY",
            DiagnosticCode::Unbalanced => "UNBALANCED",
            DiagnosticCode::MultipleInferred => "MULTIPLE_INFERRED",
            DiagnosticCode::ParseError => "PARSE_ERROR",
            DiagnosticCode::FileNotFound => "FILE_NOT_FOUND",
            DiagnosticCode::FileTooLarge => "FILE_TOO_LARGE",
            DiagnosticCode::EncodingError => "ENCODING_ERROR",
            DiagnosticCode::CycleDetected => "CYCLE_DETECTED",
        }
    }
}

/// Diagnostic severity, independent of any protocol type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    /// Must be fixed
    Error,
    /// Suspicious but legal
    Warning,
    /// Informational nudge
    Hint,
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisDiagnostic {
    /// Stable code from the taxonomy
    pub code: DiagnosticCode,
    /// Severity
    pub severity: DiagnosticSeverity,
    /// File the finding applies to
    pub path: PathBuf,
    /// Source range within that file
    pub span: Span,
    /// Human-readable message
    pub message: String,
}

/// Everything derived from a resolved workspace.
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    /// Account completion index
    pub accounts: AccountIndex,
    /// Payees sorted by descending usage then ascending name
    pub payees: Vec<UsageEntry>,
    /// Usage count per payee
    pub payee_counts: FxHashMap<String, u32>,
    /// Commodities sorted by descending usage then ascending name
    pub commodities: Vec<UsageEntry>,
    /// Usage count per commodity
    pub commodity_counts: FxHashMap<String, u32>,
    /// Commodities with a `commodity` directive
    pub declared_commodities: FxHashSet<String>,
    /// Tag names sorted by descending usage then ascending name
    pub tag_names: Vec<UsageEntry>,
    /// Usage count per tag name
    pub tag_counts: FxHashMap<String, u32>,
    /// Tag name → sorted unique values
    pub tag_values: BTreeMap<String, Vec<String>>,
    /// Usage count per (tag name, value) pair
    pub tag_value_counts: FxHashMap<(String, String), u32>,
    /// Distinct transaction dates, ascending, formatted in `date_style`
    pub dates: Vec<String>,
    /// Dominant date style across the workspace
    pub date_style: DateStyle,
    /// Per-payee posting template from the most recent transaction
    pub templates: FxHashMap<String, PostingTemplate>,
    /// Declared number format per commodity symbol, last directive wins
    pub commodity_formats: FxHashMap<String, CommodityFormat>,
    /// Validation diagnostics in deterministic file/source order
    pub diagnostics: Vec<AnalysisDiagnostic>,
}
