//! Workspace analysis: the indices behind every interactive request.
//!
//! [`analyze`] turns a [`ResolvedJournal`](hledger_resolve::ResolvedJournal)
//! into an [`AnalysisResult`]: frequency-ranked account/payee/commodity
//! indices partitioned by prefix, tag and date inventories, per-payee
//! posting templates, declared commodity number formats, and validation
//! diagnostics. The analyzer is pure (no I/O, no clocks) and its output
//! is deterministic for identical input: every list is explicitly sorted.

#![deny(unsafe_code)]

mod analyzer;
mod balance;
mod commodity_format;
mod types;

pub use analyzer::analyze;
pub use commodity_format::CommodityFormat;
pub use types::{
    AccountIndex, AnalysisDiagnostic, AnalysisResult, DiagnosticCode, DiagnosticSeverity,
    PostingTemplate, TemplatePosting, UsageEntry,
};
