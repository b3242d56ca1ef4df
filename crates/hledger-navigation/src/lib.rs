//! Navigation features over a resolved workspace: definition, references,
//! hover, symbols, folding ranges and document links.
//!
//! All lookups run against AST spans; since every [`Span`] already carries
//! protocol coordinates, no text re-scanning happens on these paths.

#![deny(unsafe_code)]

mod definition;
mod element;
mod folding;
mod hover;
mod links;
mod references;
mod symbols;

pub use definition::definition;
pub use element::{element_at, Element};
pub use folding::folding_ranges;
pub use hover::hover;
pub use links::document_links;
pub use references::references;
pub use symbols::{document_symbols, workspace_symbols};

use hledger_position::Span;
use lsp_types::{Position, Range};

/// Convert an AST span to a protocol range (0-based line, UTF-16 column).
pub fn span_to_range(span: Span) -> Range {
    Range {
        start: Position {
            line: span.start.line.saturating_sub(1),
            character: span.start.utf16_col,
        },
        end: Position { line: span.end.line.saturating_sub(1), character: span.end.utf16_col },
    }
}
