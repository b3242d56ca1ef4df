//! Journal language engine: lexer, parser and AST for hledger files.
//!
//! A journal is a plain-text file of dated transactions with indented
//! postings, interleaved with directives (`account`, `commodity`,
//! `include`, `P`, `Y`, `alias`, ...). The lexer never fails; the parser
//! always returns a [`Journal`], collecting recoverable errors instead of
//! aborting. Every AST node carries a [`Span`](hledger_position::Span)
//! with byte, line/column and UTF-16 coordinates.

#![deny(unsafe_code)]

pub mod ast;
pub mod date;
pub mod decimal;
pub mod lexer;
pub mod parser;
pub mod tags;
pub mod token;

pub use ast::{
    AccountDecl, AliasDecl, Amount, BalanceAssertion, Comment, CommodityDecl, Cost, Directive,
    IncludeDecl, Journal, OtherDecl, ParseError, ParseErrorSeverity, Posting, PriceDecl, Status,
    Tag, Transaction, YearDecl,
};
pub use date::{DateStyle, SmartDate};
pub use decimal::Decimal;
pub use lexer::Lexer;
pub use parser::{parse, parse_with, ParserOptions};
pub use token::{Token, TokenKind};
