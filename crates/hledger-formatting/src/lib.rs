//! Formatting: full-document posting alignment and on-type edits.
//!
//! The formatter reflows whitespace only: accounts, amounts and comments
//! keep their text (amounts are re-rendered through the commodity's
//! declared format when one exists). Output is a minimal list of text
//! edits, one per line that actually changes.

#![deny(unsafe_code)]

mod document;
mod on_type;

pub use document::{format_document, FormatSettings};
pub use on_type::on_type;
