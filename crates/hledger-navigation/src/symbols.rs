//! Document and workspace symbols.

use crate::span_to_range;
use hledger_journal::{Directive, Journal};
use hledger_resolve::ResolvedJournal;
use lsp_types::{DocumentSymbol, Location, SymbolInformation, SymbolKind};

/// Outline symbols for one file: transactions and the declaration-like
/// directives.
pub fn document_symbols(journal: &Journal) -> Vec<DocumentSymbol> {
    let mut symbols = Vec::new();

    for directive in &journal.directives {
        let (name, kind, selection) = match directive {
            Directive::Account(decl) => (decl.name.clone(), SymbolKind::CLASS, decl.name_span),
            Directive::Commodity(decl) => {
                (decl.symbol.clone(), SymbolKind::ENUM, decl.symbol_span)
            }
            Directive::Price(decl) => (
                format!("P {} {}", decl.date.raw, decl.commodity),
                SymbolKind::CONSTANT,
                decl.commodity_span,
            ),
            Directive::Include(decl) => {
                (decl.path.clone(), SymbolKind::MODULE, decl.path_span)
            }
            _ => continue,
        };
        #[allow(deprecated)]
        symbols.push(DocumentSymbol {
            name,
            detail: None,
            kind,
            tags: None,
            deprecated: None,
            range: span_to_range(directive.span()),
            selection_range: span_to_range(selection),
            children: None,
        });
    }

    for transaction in &journal.transactions {
        let mut name = transaction.primary_date.raw.clone();
        if let Some(payee) = &transaction.payee {
            name.push(' ');
            name.push_str(payee);
        }
        #[allow(deprecated)]
        symbols.push(DocumentSymbol {
            name,
            detail: None,
            kind: SymbolKind::FUNCTION,
            tags: None,
            deprecated: None,
            range: span_to_range(transaction.span),
            selection_range: span_to_range(
                transaction.payee_span.unwrap_or(transaction.primary_date.span),
            ),
            children: None,
        });
    }

    symbols.sort_by_key(|s| (s.range.start.line, s.range.start.character));
    symbols
}

/// Case-insensitive substring search over symbol names across the whole
/// workspace.
pub fn workspace_symbols(resolved: &ResolvedJournal, query: &str) -> Vec<SymbolInformation> {
    let needle = query.to_lowercase();
    let mut out = Vec::new();
    for (path, journal) in resolved.files_in_order() {
        let Some(uri) = crate::links::file_uri(path) else { continue };
        for symbol in document_symbols(journal) {
            if !needle.is_empty() && !symbol.name.to_lowercase().contains(&needle) {
                continue;
            }
            #[allow(deprecated)]
            out.push(SymbolInformation {
                name: symbol.name,
                kind: symbol.kind,
                tags: None,
                deprecated: None,
                location: Location { uri: uri.clone(), range: symbol.range },
                container_name: None,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hledger_journal::{parse_with, ParserOptions};
    use pretty_assertions::assert_eq;

    fn journal(src: &str) -> Journal {
        parse_with(src, &ParserOptions { fallback_year: 2024 })
    }

    #[test]
    fn symbol_kinds_follow_the_node_kind() {
        let j = journal(
            "account expenses:food\ncommodity EUR\nP 2024-01-01 EUR 1.10 USD\ninclude other.journal\n2024-01-02 Shop\n    a  1 EUR\n    b\n",
        );
        let symbols = document_symbols(&j);
        let kinds: Vec<SymbolKind> = symbols.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SymbolKind::CLASS,
                SymbolKind::ENUM,
                SymbolKind::CONSTANT,
                SymbolKind::MODULE,
                SymbolKind::FUNCTION,
            ]
        );
        assert_eq!(symbols[4].name, "2024-01-02 Shop");
    }
}
