//! Completion: classify the cursor, fuzzy-match the indices, rank, cap.
//!
//! This is the most-invoked hot path of the server. The engine never
//! touches I/O: it reads the text, the precomputed
//! [`AnalysisResult`](hledger_analysis::AnalysisResult) and the cursor
//! position, and produces an ordered
//! [`CompletionList`](lsp_types::CompletionList).
//!
//! Two response invariants keep editors from fighting the ranking:
//! `is_incomplete` is always true (the editor re-asks instead of
//! re-sorting), and every item carries the same `filter_text` (the
//! editor's own fuzzy scorer sees identical strings and preserves our
//! order).

#![deny(unsafe_code)]

mod context;
mod engine;
mod fuzzy;

pub use context::{classify, ContextKind, CursorContext};
pub use engine::{complete, CompletionRequest};
pub use fuzzy::{account_score, fuzzy_score};
