//! Property tests: the lexer always terminates, the parser never
//! panics, and AST ranges stay inside the document and in source order.

use hledger_journal::{parse_with, Lexer, ParserOptions, TokenKind};
use hledger_position::Span;
use proptest::prelude::*;

fn options() -> ParserOptions {
    ParserOptions { fallback_year: 2024 }
}

/// Fragments that compose into journal-shaped (and journal-adjacent)
/// documents.
fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("2024-01-15 * Grocery Store | note ; trip:norway\n".to_string()),
        Just("    expenses:food  10.50 EUR\n".to_string()),
        Just("    assets:cash\n".to_string()),
        Just("    Активы:Кошелек  -1 000,00 RUB @@ 12 USD\n".to_string()),
        Just("account expenses:food\n".to_string()),
        Just("commodity 1.000,00 EUR\n".to_string()),
        Just("P 2024-01-01 EUR 1.10 USD\n".to_string()),
        Just("include other.journal\n".to_string()),
        Just("Y 2021\n".to_string()),
        Just("; a comment line\n".to_string()),
        Just("\n".to_string()),
        Just("03/07 short date payee\n".to_string()),
        Just("garbage that is not a journal line\n".to_string()),
        Just("2024-99-99 broken date\n".to_string()),
        Just("    a  1.\n".to_string()),
        "[ -~а-яё😀]{0,20}\n".prop_map(|s| s),
    ]
}

fn document() -> impl Strategy<Value = String> {
    proptest::collection::vec(fragment(), 0..12).prop_map(|v| v.concat())
}

/// Spans in AST order: transactions (with their postings) and directives
/// each appear in source order, so their starts must be non-decreasing.
fn span_sequences(journal: &hledger_journal::Journal) -> Vec<Vec<Span>> {
    let mut sequences = Vec::new();
    sequences.push(journal.directives.iter().map(|d| d.span()).collect());
    sequences.push(journal.transactions.iter().map(|t| t.span).collect());
    for transaction in &journal.transactions {
        sequences.push(transaction.postings.iter().map(|p| p.span).collect());
    }
    sequences
}

proptest! {
    #[test]
    fn lexer_terminates_with_eof(text in document()) {
        let tokens = Lexer::new(&text).tokenize();
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        // every token lies inside the document
        for token in &tokens {
            prop_assert!(token.span.end.byte <= text.len());
        }
    }

    #[test]
    fn parser_ranges_are_in_document_and_ordered(text in document()) {
        let journal = parse_with(&text, &options());
        for sequence in span_sequences(&journal) {
            let mut previous_start = 0usize;
            for span in sequence {
                prop_assert!(span.start.byte <= span.end.byte);
                prop_assert!(span.end.byte <= text.len());
                prop_assert!(span.start.byte >= previous_start);
                previous_start = span.start.byte;
            }
        }
    }

    #[test]
    fn child_ranges_nest_in_parents(text in document()) {
        let journal = parse_with(&text, &options());
        for transaction in &journal.transactions {
            for posting in &transaction.postings {
                prop_assert!(transaction.span.contains_span(posting.span));
                if let Some(amount) = &posting.amount {
                    prop_assert!(posting.span.contains_span(amount.span));
                }
            }
        }
    }
}
