//! Position tracking and text-edit application for hledger-lsp.
//!
//! The Language Server Protocol addresses documents in 0-based lines and
//! UTF-16 code units, while the journal engine works in UTF-8 bytes. This
//! crate owns the conversion in both directions:
//!
//! - [`Pos`] / [`Span`] - source positions carried on every AST node,
//!   tracking byte offset, 1-based line/column and the UTF-16 column at once
//! - [`LineIndex`] - per-line byte offsets for O(log lines) lookups between
//!   byte offsets and protocol positions
//! - [`apply_change`] - incremental `textDocument/didChange` application

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod edit;
mod line_index;
mod span;

pub use edit::apply_change;
pub use line_index::LineIndex;
pub use span::{Pos, Span};
