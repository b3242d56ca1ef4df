//! Token types for the journal lexer.

use hledger_position::Span;

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Transaction or price date: `2024-01-15`, `01/15`, `1.5`
    Date,
    /// Transaction status marker: `*` or `!`
    Status,
    /// Parenthesized transaction code: `(INV-1)`
    Code,
    /// Free text (descriptions, directive arguments, unrecognized runs)
    Text,
    /// Payee/note separator: `|`
    Pipe,
    /// Leading whitespace of an indented line
    Indent,
    /// Account name on a posting or `account` directive
    Account,
    /// Numeric literal, sign and thousand separators included
    Number,
    /// Commodity symbol or ticker: `$`, `EUR`, `"AAPL shares"`
    Commodity,
    /// Unit-cost operator: `@`
    At,
    /// Total-cost operator: `@@`
    AtAt,
    /// Balance-assertion operator: `=`
    Equals,
    /// Strict balance-assertion operator: `==`
    DoubleEquals,
    /// Comment text; the lexeme excludes the marker, the span includes it
    Comment,
    /// Directive keyword at column 0 (`account`, `include`, `P`, ...)
    Directive,
    /// A `name:value` pair inside a comment
    Tag,
    /// End of a line
    Newline,
    /// End of input
    Eof,
}

/// A lexed token: kind, raw text and source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The token kind
    pub kind: TokenKind,
    /// The raw text of the token
    pub lexeme: String,
    /// Source range of the token
    pub span: Span,
}

impl Token {
    /// Create a token.
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Token { kind, lexeme: lexeme.into(), span }
    }
}
