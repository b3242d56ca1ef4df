//! Find-all-references across the resolved workspace.

use crate::element::Element;
use hledger_journal::{Directive, Journal};
use hledger_position::Span;
use hledger_resolve::ResolvedJournal;
use std::path::PathBuf;

/// Collect every occurrence of `element` across the workspace.
///
/// `include_declaration` controls whether `account`/`commodity` directive
/// sites are listed; payees and tags have no declarations, so the flag is
/// irrelevant for them. Results are deduplicated and ordered by
/// `(path, line, column)`.
pub fn references(
    resolved: &ResolvedJournal,
    element: &Element,
    include_declaration: bool,
) -> Vec<(PathBuf, Span)> {
    let mut out: Vec<(PathBuf, Span)> = Vec::new();
    for (path, journal) in resolved.files_in_order() {
        collect_in_file(journal, element, include_declaration, path, &mut out);
    }
    out.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.start.line.cmp(&b.1.start.line))
            .then_with(|| a.1.start.utf16_col.cmp(&b.1.start.utf16_col))
            .then_with(|| a.1.end.utf16_col.cmp(&b.1.end.utf16_col))
    });
    out.dedup_by(|a, b| {
        a.0 == b.0
            && a.1.start.line == b.1.start.line
            && a.1.start.utf16_col == b.1.start.utf16_col
            && a.1.end.utf16_col == b.1.end.utf16_col
    });
    out
}

fn collect_in_file(
    journal: &Journal,
    element: &Element,
    include_declaration: bool,
    path: &PathBuf,
    out: &mut Vec<(PathBuf, Span)>,
) {
    let mut push = |span: Span| out.push((path.clone(), span));

    match element {
        Element::Account { name, .. } => {
            if include_declaration {
                for directive in &journal.directives {
                    if let Directive::Account(decl) = directive {
                        if decl.name == *name {
                            push(decl.name_span);
                        }
                    }
                }
            }
            for (_, posting) in journal.postings() {
                if posting.account == *name {
                    push(posting.account_span);
                }
            }
        }
        Element::Commodity { name, .. } => {
            for directive in &journal.directives {
                match directive {
                    Directive::Commodity(decl) if decl.symbol == *name => {
                        if include_declaration {
                            push(decl.symbol_span);
                        }
                    }
                    Directive::Price(decl) => {
                        if decl.commodity == *name {
                            push(decl.commodity_span);
                        }
                        if decl.amount.commodity == *name {
                            if let Some(span) = decl.amount.commodity_span {
                                push(span);
                            }
                        }
                    }
                    _ => {}
                }
            }
            for (_, posting) in journal.postings() {
                for amount in [
                    posting.amount.as_ref(),
                    posting.cost.as_ref().map(|c| &c.amount),
                    posting.balance_assertion.as_ref().map(|a| &a.amount),
                ]
                .into_iter()
                .flatten()
                {
                    if amount.commodity == *name {
                        if let Some(span) = amount.commodity_span {
                            push(span);
                        }
                    }
                }
            }
        }
        Element::Payee { name, .. } => {
            for transaction in &journal.transactions {
                if transaction.payee.as_deref() == Some(name) {
                    if let Some(span) = transaction.payee_span {
                        push(span);
                    }
                }
            }
        }
        Element::TagName { name, .. } => {
            for transaction in &journal.transactions {
                for tag in transaction
                    .tags
                    .iter()
                    .chain(transaction.postings.iter().flat_map(|p| p.tags.iter()))
                {
                    if tag.name == *name {
                        push(tag.span);
                    }
                }
            }
        }
        Element::TagValue { name, value, .. } => {
            for transaction in &journal.transactions {
                for tag in transaction
                    .tags
                    .iter()
                    .chain(transaction.postings.iter().flat_map(|p| p.tags.iter()))
                {
                    if tag.name == *name && tag.value == *value {
                        if let Some(span) = tag.value_span {
                            push(span);
                        }
                    }
                }
            }
        }
        Element::Amount { .. } => {}
    }
}
