//! Semantic tokens: legend, collection, delta encoding and caching.
//!
//! The legend's indices are a stable contract with clients:
//! 0 account, 1 commodity, 2 payee, 3 date, 4 amount, 5 tag, 6 directive,
//! 7 code, 8 status, 9 comment, 10 string, 11 operator, 12 tagValue.
//! Modifiers: bit 0 declaration, bit 1 definition.

#![deny(unsafe_code)]

mod cache;
mod collect;

pub use cache::TokenCache;
pub use collect::{collect_tokens, AbsoluteToken};

use lsp_types::{SemanticToken, SemanticTokenModifier, SemanticTokenType, SemanticTokensLegend};

/// Token type indices. Order defines the legend and must not change.
pub mod token_type {
    /// Account name
    pub const ACCOUNT: u32 = 0;
    /// Commodity symbol
    pub const COMMODITY: u32 = 1;
    /// Transaction payee
    pub const PAYEE: u32 = 2;
    /// Date literal
    pub const DATE: u32 = 3;
    /// Amount number
    pub const AMOUNT: u32 = 4;
    /// Tag name
    pub const TAG: u32 = 5;
    /// Directive keyword
    pub const DIRECTIVE: u32 = 6;
    /// Transaction code
    pub const CODE: u32 = 7;
    /// Status marker
    pub const STATUS: u32 = 8;
    /// Comment text
    pub const COMMENT: u32 = 9;
    /// Other literal text (include paths, notes)
    pub const STRING: u32 = 10;
    /// Cost and assertion operators
    pub const OPERATOR: u32 = 11;
    /// Tag value
    pub const TAG_VALUE: u32 = 12;
}

/// Modifier bits.
pub mod token_modifier {
    /// Declared by a directive
    pub const DECLARATION: u32 = 1 << 0;
    /// Definition site
    pub const DEFINITION: u32 = 1 << 1;
}

/// The fixed legend advertised in the server capabilities.
pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: vec![
            SemanticTokenType::new("account"),
            SemanticTokenType::new("commodity"),
            SemanticTokenType::new("payee"),
            SemanticTokenType::new("date"),
            SemanticTokenType::new("amount"),
            SemanticTokenType::new("tag"),
            SemanticTokenType::new("directive"),
            SemanticTokenType::new("code"),
            SemanticTokenType::new("status"),
            SemanticTokenType::new("comment"),
            SemanticTokenType::new("string"),
            SemanticTokenType::new("operator"),
            SemanticTokenType::new("tagValue"),
        ],
        token_modifiers: vec![
            SemanticTokenModifier::new("declaration"),
            SemanticTokenModifier::new("definition"),
        ],
    }
}

/// Delta-encode absolute tokens into the wire format.
pub fn encode(tokens: &[AbsoluteToken]) -> Vec<SemanticToken> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;
    for token in tokens {
        let delta_line = token.line - prev_line;
        let delta_start =
            if delta_line == 0 { token.start - prev_start } else { token.start };
        out.push(SemanticToken {
            delta_line,
            delta_start,
            length: token.length,
            token_type: token.token_type,
            token_modifiers_bitset: token.modifiers,
        });
        prev_line = token.line;
        prev_start = token.start;
    }
    out
}
