//! AST for journal files.
//!
//! Nodes reference no parents; navigation works over the range-ordered
//! flat lists inside [`Journal`]. Every node carries a [`Span`].

use crate::date::SmartDate;
use crate::decimal::Decimal;
use hledger_position::Span;

/// A parsed journal file.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    /// Transactions in source order
    pub transactions: Vec<Transaction>,
    /// Directives in source order (includes excluded, see `includes`)
    pub directives: Vec<Directive>,
    /// Include directives in source order
    pub includes: Vec<IncludeDecl>,
    /// File-level comment lines (used for folding comment runs)
    pub comments: Vec<Comment>,
    /// Errors collected during parsing; never aborts the parse
    pub parse_errors: Vec<ParseError>,
}

/// Transaction status marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// No marker
    #[default]
    Unmarked,
    /// `!`
    Pending,
    /// `*`
    Cleared,
}

/// A dated transaction with its postings.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// The (resolved) primary date
    pub primary_date: SmartDate,
    /// Optional secondary date after `=`
    pub secondary_date: Option<SmartDate>,
    /// Status marker
    pub status: Status,
    /// Span of the status marker, when present
    pub status_span: Option<Span>,
    /// Transaction code without parentheses, e.g. `INV-1`
    pub code: Option<String>,
    /// Span of the code including parentheses
    pub code_span: Option<Span>,
    /// Description text before `|`
    pub payee: Option<String>,
    /// Span of the payee text
    pub payee_span: Option<Span>,
    /// Note text after `|`
    pub description: Option<String>,
    /// Span of the note text
    pub description_span: Option<Span>,
    /// Comments on the header line and indented comment lines before the
    /// first posting
    pub comments: Vec<Comment>,
    /// Tags extracted from this transaction's comments
    pub tags: Vec<Tag>,
    /// Postings in source order; spans are pairwise non-overlapping
    pub postings: Vec<Posting>,
    /// Span of the whole transaction
    pub span: Span,
}

/// An indented posting line: account plus optional amount, cost and
/// balance assertion.
#[derive(Debug, Clone)]
pub struct Posting {
    /// Account name
    pub account: String,
    /// Span of the account name
    pub account_span: Span,
    /// Amount, if written (at most one posting per transaction may omit it)
    pub amount: Option<Amount>,
    /// Cost annotation (`@` / `@@`)
    pub cost: Option<Cost>,
    /// Balance assertion (`=` / `==`)
    pub balance_assertion: Option<BalanceAssertion>,
    /// Comments attached to this posting
    pub comments: Vec<Comment>,
    /// Tags extracted from this posting's comments
    pub tags: Vec<Tag>,
    /// Span of the posting line content
    pub span: Span,
}

/// An amount: quantity plus commodity.
#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    /// The numeric quantity
    pub quantity: Decimal,
    /// Commodity symbol; empty when the amount has none
    pub commodity: String,
    /// True for `$50`, false for `50 EUR` (lexical order)
    pub commodity_left: bool,
    /// The amount exactly as written, commodity position included
    pub raw_text: String,
    /// Span of the whole amount
    pub span: Span,
    /// Span of the numeric part
    pub number_span: Span,
    /// Span of the commodity symbol, when present
    pub commodity_span: Option<Span>,
}

/// Cost annotation on a posting.
#[derive(Debug, Clone, PartialEq)]
pub struct Cost {
    /// The cost amount
    pub amount: Amount,
    /// True for `@@` (total cost), false for `@` (per unit)
    pub is_total: bool,
    /// Span from the operator through the amount
    pub span: Span,
}

/// Balance assertion on a posting.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceAssertion {
    /// The asserted amount
    pub amount: Amount,
    /// True for `==`
    pub is_strict: bool,
    /// Span from the operator through the amount
    pub span: Span,
}

/// A comment, on its own line or trailing other content.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Comment text after the marker
    pub text: String,
    /// Span starting at the marker
    pub span: Span,
}

/// A `name:value` tag inside a comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    /// Tag name
    pub name: String,
    /// Tag value, possibly empty
    pub value: String,
    /// Span of the name
    pub span: Span,
    /// Span of the value, when non-empty
    pub value_span: Option<Span>,
}

/// A top-level statement that is not a transaction.
#[derive(Debug, Clone)]
pub enum Directive {
    /// `account <name>`
    Account(AccountDecl),
    /// `commodity <symbol or format>` with optional indented `format`
    Commodity(CommodityDecl),
    /// `P <date> <commodity> <amount>`
    Price(PriceDecl),
    /// `Y <year>`
    DefaultYear(YearDecl),
    /// `alias <old> = <new>`
    Alias(AliasDecl),
    /// `include <path>`
    Include(IncludeDecl),
    /// Any other directive; kept so unknown kinds never break parsing
    Other(OtherDecl),
}

impl Directive {
    /// Span of the whole directive.
    pub fn span(&self) -> Span {
        match self {
            Directive::Account(d) => d.span,
            Directive::Commodity(d) => d.span,
            Directive::Price(d) => d.span,
            Directive::DefaultYear(d) => d.span,
            Directive::Alias(d) => d.span,
            Directive::Include(d) => d.span,
            Directive::Other(d) => d.span,
        }
    }

    /// Span of the directive keyword.
    pub fn keyword_span(&self) -> Span {
        match self {
            Directive::Account(d) => d.keyword_span,
            Directive::Commodity(d) => d.keyword_span,
            Directive::Price(d) => d.keyword_span,
            Directive::DefaultYear(d) => d.keyword_span,
            Directive::Alias(d) => d.keyword_span,
            Directive::Include(d) => d.keyword_span,
            Directive::Other(d) => d.keyword_span,
        }
    }
}

/// `account` directive.
#[derive(Debug, Clone)]
pub struct AccountDecl {
    /// Declared account name
    pub name: String,
    /// Span of the name
    pub name_span: Span,
    /// Span of the keyword
    pub keyword_span: Span,
    /// Span of the whole directive
    pub span: Span,
}

/// `commodity` directive.
#[derive(Debug, Clone)]
pub struct CommodityDecl {
    /// Commodity symbol
    pub symbol: String,
    /// Span of the symbol
    pub symbol_span: Span,
    /// Example-amount format template, from the directive argument or an
    /// indented `format` sub-directive; the last declaration wins
    pub format: Option<String>,
    /// Span of the keyword
    pub keyword_span: Span,
    /// Span of the whole directive
    pub span: Span,
}

/// `P` market-price directive.
#[derive(Debug, Clone)]
pub struct PriceDecl {
    /// Date of the price
    pub date: SmartDate,
    /// Commodity being priced
    pub commodity: String,
    /// Span of the commodity
    pub commodity_span: Span,
    /// Unit price
    pub amount: Amount,
    /// Span of the keyword
    pub keyword_span: Span,
    /// Span of the whole directive
    pub span: Span,
}

/// `Y` default-year directive.
#[derive(Debug, Clone)]
pub struct YearDecl {
    /// The year applied to subsequent short dates
    pub year: i32,
    /// Span of the keyword
    pub keyword_span: Span,
    /// Span of the whole directive
    pub span: Span,
}

/// `alias` directive.
#[derive(Debug, Clone)]
pub struct AliasDecl {
    /// Account name (or regex) being aliased
    pub from: String,
    /// Replacement account name
    pub to: String,
    /// Span of the keyword
    pub keyword_span: Span,
    /// Span of the whole directive
    pub span: Span,
}

/// `include` directive.
#[derive(Debug, Clone)]
pub struct IncludeDecl {
    /// Path as written, resolved against the including file's directory
    pub path: String,
    /// Span of the path text
    pub path_span: Span,
    /// Span of the keyword
    pub keyword_span: Span,
    /// Span of the whole directive
    pub span: Span,
}

/// Unrecognized or untracked directive (`D`, `payee`, `tag`, ...).
#[derive(Debug, Clone)]
pub struct OtherDecl {
    /// The directive keyword
    pub keyword: String,
    /// Span of the keyword
    pub keyword_span: Span,
    /// Span of the whole directive
    pub span: Span,
}

/// Severity of a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorSeverity {
    /// A construct could not be parsed
    Error,
    /// The parse succeeded with a guess the user should confirm
    Hint,
}

/// A recoverable parse error.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Human-readable message
    pub message: String,
    /// Source range the error applies to
    pub span: Span,
    /// Severity of the error
    pub severity: ParseErrorSeverity,
}

impl Journal {
    /// Iterate all postings of all transactions.
    pub fn postings(&self) -> impl Iterator<Item = (&Transaction, &Posting)> {
        self.transactions.iter().flat_map(|t| t.postings.iter().map(move |p| (t, p)))
    }
}
