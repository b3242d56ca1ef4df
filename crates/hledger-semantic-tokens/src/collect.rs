//! Token collection from the AST.

use crate::{token_modifier, token_type};
use hledger_journal::{Amount, Comment, Directive, Journal, Tag};
use hledger_position::Span;

/// A semantic token in absolute coordinates, before delta encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsoluteToken {
    /// 0-based line
    pub line: u32,
    /// Start column in UTF-16 units
    pub start: u32,
    /// Length in UTF-16 units
    pub length: u32,
    /// Legend index
    pub token_type: u32,
    /// Modifier bitset
    pub modifiers: u32,
}

fn token(span: Span, token_type: u32, modifiers: u32) -> AbsoluteToken {
    AbsoluteToken {
        line: span.start.line.saturating_sub(1),
        start: span.start.utf16_col,
        length: span.end.utf16_col.saturating_sub(span.start.utf16_col),
        token_type,
        modifiers,
    }
}

/// Collect the semantic tokens of one file, sorted by position.
pub fn collect_tokens(journal: &Journal) -> Vec<AbsoluteToken> {
    let mut out = Vec::new();

    for directive in &journal.directives {
        out.push(token(directive.keyword_span(), token_type::DIRECTIVE, 0));
        match directive {
            Directive::Account(decl) => out.push(token(
                decl.name_span,
                token_type::ACCOUNT,
                token_modifier::DECLARATION,
            )),
            Directive::Commodity(decl) => out.push(token(
                decl.symbol_span,
                token_type::COMMODITY,
                token_modifier::DECLARATION,
            )),
            Directive::Price(decl) => {
                out.push(token(decl.date.span, token_type::DATE, 0));
                out.push(token(decl.commodity_span, token_type::COMMODITY, 0));
                push_amount(&mut out, &decl.amount);
            }
            Directive::Include(decl) => {
                out.push(token(decl.path_span, token_type::STRING, 0));
            }
            _ => {}
        }
    }

    for comment in &journal.comments {
        out.push(token(comment.span, token_type::COMMENT, 0));
    }

    for transaction in &journal.transactions {
        out.push(token(transaction.primary_date.span, token_type::DATE, 0));
        if let Some(secondary) = &transaction.secondary_date {
            out.push(token(secondary.span, token_type::DATE, 0));
        }
        if let Some(span) = transaction.status_span {
            out.push(token(span, token_type::STATUS, 0));
        }
        if let Some(span) = transaction.code_span {
            out.push(token(span, token_type::CODE, 0));
        }
        if let Some(span) = transaction.payee_span {
            out.push(token(span, token_type::PAYEE, 0));
        }
        if let Some(span) = transaction.description_span {
            out.push(token(span, token_type::STRING, 0));
        }
        push_comments(&mut out, &transaction.comments, &transaction.tags);

        for posting in &transaction.postings {
            out.push(token(posting.account_span, token_type::ACCOUNT, 0));
            if let Some(amount) = &posting.amount {
                push_amount(&mut out, amount);
            }
            if let Some(cost) = &posting.cost {
                let op_len = if cost.is_total { 2 } else { 1 };
                out.push(AbsoluteToken {
                    line: cost.span.start.line.saturating_sub(1),
                    start: cost.span.start.utf16_col,
                    length: op_len,
                    token_type: token_type::OPERATOR,
                    modifiers: 0,
                });
                push_amount(&mut out, &cost.amount);
            }
            if let Some(assertion) = &posting.balance_assertion {
                let op_len = if assertion.is_strict { 2 } else { 1 };
                out.push(AbsoluteToken {
                    line: assertion.span.start.line.saturating_sub(1),
                    start: assertion.span.start.utf16_col,
                    length: op_len,
                    token_type: token_type::OPERATOR,
                    modifiers: 0,
                });
                push_amount(&mut out, &assertion.amount);
            }
            push_comments(&mut out, &posting.comments, &posting.tags);
        }
    }

    out.sort_by_key(|t| (t.line, t.start));
    out.dedup_by_key(|t| (t.line, t.start));
    out
}

fn push_amount(out: &mut Vec<AbsoluteToken>, amount: &Amount) {
    out.push(token(amount.number_span, token_type::AMOUNT, 0));
    if let Some(span) = amount.commodity_span {
        out.push(token(span, token_type::COMMODITY, 0));
    }
}

/// Comments render as tag/value tokens where tags exist, and as plain
/// comment tokens otherwise. Tokens must not overlap, so a comment that
/// contains tags contributes only its tag pieces.
fn push_comments(out: &mut Vec<AbsoluteToken>, comments: &[Comment], tags: &[Tag]) {
    for comment in comments {
        let has_tags = tags.iter().any(|t| comment.span.contains_span(t.span));
        if !has_tags {
            out.push(token(comment.span, token_type::COMMENT, 0));
        }
    }
    for tag in tags {
        out.push(token(tag.span, token_type::TAG, 0));
        if let Some(span) = tag.value_span {
            out.push(token(span, token_type::TAG_VALUE, 0));
        }
    }
}
