//! Finding the element under the cursor.

use hledger_journal::{Amount, Cost, Directive, Journal};
use hledger_position::Span;

/// A recognizable element at a cursor position.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// An account name in a posting or `account` directive
    Account {
        /// Account name
        name: String,
        /// Span of the occurrence under the cursor
        span: Span,
    },
    /// A commodity symbol in an amount or `commodity`/`P` directive
    Commodity {
        /// Commodity symbol
        name: String,
        /// Span of the occurrence
        span: Span,
    },
    /// A transaction description
    Payee {
        /// Payee text
        name: String,
        /// Span of the occurrence
        span: Span,
    },
    /// A tag name inside a comment
    TagName {
        /// Tag name
        name: String,
        /// Span of the name
        span: Span,
    },
    /// A tag value inside a comment
    TagValue {
        /// Tag name
        name: String,
        /// Tag value
        value: String,
        /// Span of the value
        span: Span,
    },
    /// An amount, with its cost annotation when present
    Amount {
        /// The amount
        amount: Amount,
        /// Cost annotation of the enclosing posting
        cost: Option<Cost>,
        /// Span of the amount
        span: Span,
    },
}

/// Find the element at a byte offset in one file's journal.
///
/// The cursor counts as inside a span when it sits anywhere from the
/// span's first byte through the position just after its last byte.
pub fn element_at(journal: &Journal, byte: usize) -> Option<Element> {
    for directive in &journal.directives {
        match directive {
            Directive::Account(decl) if decl.name_span.contains_inclusive(byte) => {
                return Some(Element::Account { name: decl.name.clone(), span: decl.name_span });
            }
            Directive::Commodity(decl) if decl.symbol_span.contains_inclusive(byte) => {
                return Some(Element::Commodity {
                    name: decl.symbol.clone(),
                    span: decl.symbol_span,
                });
            }
            Directive::Price(decl) if decl.commodity_span.contains_inclusive(byte) => {
                return Some(Element::Commodity {
                    name: decl.commodity.clone(),
                    span: decl.commodity_span,
                });
            }
            Directive::Price(decl) if decl.amount.span.contains_inclusive(byte) => {
                return amount_element(&decl.amount, None, byte);
            }
            _ => {}
        }
    }

    for transaction in &journal.transactions {
        if !transaction.span.contains_inclusive(byte) {
            continue;
        }
        if let (Some(payee), Some(span)) = (&transaction.payee, transaction.payee_span) {
            if span.contains_inclusive(byte) {
                return Some(Element::Payee { name: payee.clone(), span });
            }
        }
        if let Some(element) = tag_element(&transaction.tags, byte) {
            return Some(element);
        }
        for posting in &transaction.postings {
            if !posting.span.contains_inclusive(byte) {
                continue;
            }
            if posting.account_span.contains_inclusive(byte) {
                return Some(Element::Account {
                    name: posting.account.clone(),
                    span: posting.account_span,
                });
            }
            if let Some(element) = tag_element(&posting.tags, byte) {
                return Some(element);
            }
            if let Some(amount) = &posting.amount {
                if amount.span.contains_inclusive(byte) {
                    return amount_element(amount, posting.cost.as_ref(), byte);
                }
            }
            if let Some(cost) = &posting.cost {
                if cost.amount.span.contains_inclusive(byte) {
                    return amount_element(&cost.amount, None, byte);
                }
            }
            if let Some(assertion) = &posting.balance_assertion {
                if assertion.amount.span.contains_inclusive(byte) {
                    return amount_element(&assertion.amount, None, byte);
                }
            }
        }
    }
    None
}

fn amount_element(amount: &Amount, cost: Option<&Cost>, byte: usize) -> Option<Element> {
    if let Some(span) = amount.commodity_span {
        if span.contains_inclusive(byte) {
            return Some(Element::Commodity { name: amount.commodity.clone(), span });
        }
    }
    Some(Element::Amount { amount: amount.clone(), cost: cost.cloned(), span: amount.span })
}

fn tag_element(tags: &[hledger_journal::Tag], byte: usize) -> Option<Element> {
    for tag in tags {
        if tag.span.contains_inclusive(byte) {
            return Some(Element::TagName { name: tag.name.clone(), span: tag.span });
        }
        if let Some(span) = tag.value_span {
            if span.contains_inclusive(byte) {
                return Some(Element::TagValue {
                    name: tag.name.clone(),
                    value: tag.value.clone(),
                    span,
                });
            }
        }
    }
    None
}
