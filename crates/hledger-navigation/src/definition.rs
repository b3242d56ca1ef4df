//! Go-to-definition.

use crate::element::Element;
use chrono::NaiveDate;
use hledger_journal::Directive;
use hledger_position::Span;
use hledger_resolve::ResolvedJournal;
use std::path::PathBuf;

/// Resolve the definition site of an element.
///
/// A declaration directive anywhere in the workspace wins, the first one
/// in include order. Without a declaration the definition is the
/// earliest-dated first usage, ties broken by file order then source
/// position.
pub fn definition(resolved: &ResolvedJournal, element: &Element) -> Option<(PathBuf, Span)> {
    match element {
        Element::Account { name, .. } => {
            for (path, journal) in resolved.files_in_order() {
                for directive in &journal.directives {
                    if let Directive::Account(decl) = directive {
                        if decl.name == *name {
                            return Some((path.clone(), decl.name_span));
                        }
                    }
                }
            }
            earliest_usage(resolved, |journal| {
                journal
                    .transactions
                    .iter()
                    .flat_map(|t| {
                        t.postings
                            .iter()
                            .filter(|p| p.account == *name)
                            .map(move |p| (t.primary_date.date, p.account_span))
                    })
                    .collect()
            })
        }
        Element::Commodity { name, .. } => {
            for (path, journal) in resolved.files_in_order() {
                for directive in &journal.directives {
                    if let Directive::Commodity(decl) = directive {
                        if decl.symbol == *name {
                            return Some((path.clone(), decl.symbol_span));
                        }
                    }
                }
            }
            earliest_usage(resolved, |journal| {
                journal
                    .transactions
                    .iter()
                    .flat_map(|t| {
                        t.postings.iter().filter_map(move |p| {
                            let amount = p.amount.as_ref()?;
                            (amount.commodity == *name)
                                .then_some((t.primary_date.date, amount.commodity_span?))
                        })
                    })
                    .collect()
            })
        }
        Element::Payee { name, .. } => earliest_usage(resolved, |journal| {
            journal
                .transactions
                .iter()
                .filter(|t| t.payee.as_deref() == Some(name))
                .filter_map(|t| Some((t.primary_date.date, t.payee_span?)))
                .collect()
        }),
        _ => None,
    }
}

/// The earliest-dated usage across files; include order breaks date ties
/// and source position breaks same-file ties.
fn earliest_usage(
    resolved: &ResolvedJournal,
    collect: impl Fn(&hledger_journal::Journal) -> Vec<(NaiveDate, Span)>,
) -> Option<(PathBuf, Span)> {
    let mut best: Option<(NaiveDate, usize, usize, PathBuf, Span)> = None;
    for (file_idx, (path, journal)) in resolved.files_in_order().enumerate() {
        for (date, span) in collect(journal) {
            let key = (date, file_idx, span.start.byte);
            let replace = match &best {
                None => true,
                Some((bd, bf, bb, _, _)) => key < (*bd, *bf, *bb),
            };
            if replace {
                best = Some((date, file_idx, span.start.byte, path.clone(), span));
            }
        }
    }
    best.map(|(_, _, _, path, span)| (path, span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hledger_journal::ParserOptions;
    use hledger_resolve::{FileLoader, LoadFailure, ResolveConfig, Resolver};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    struct MapLoader(Vec<(PathBuf, String)>);

    impl FileLoader for MapLoader {
        fn load(&self, path: &Path) -> Result<String, LoadFailure> {
            self.0
                .iter()
                .find(|(p, _)| p == path)
                .map(|(_, t)| t.clone())
                .ok_or(LoadFailure::NotFound)
        }
    }

    fn resolve(files: &[(&str, &str)]) -> ResolvedJournal {
        let loader =
            MapLoader(files.iter().map(|(p, t)| (PathBuf::from(p), t.to_string())).collect());
        Resolver::new().resolve_with(
            Path::new(files[0].0),
            &loader,
            &ResolveConfig::default(),
            &ParserOptions { fallback_year: 2024 },
        )
    }

    fn account(name: &str) -> Element {
        Element::Account { name: name.to_string(), span: Default::default() }
    }

    #[test]
    fn declaration_wins_over_usage() {
        let resolved = resolve(&[
            (
                "/t/main.journal",
                "2024-01-01 x\n    expenses:food  1 EUR\n    b\ninclude decls.journal\n",
            ),
            ("/t/decls.journal", "account expenses:food\n"),
        ]);
        let def = definition(&resolved, &account("expenses:food"));
        assert_eq!(def.map(|(p, _)| p), Some(PathBuf::from("/t/decls.journal")));
    }

    #[test]
    fn earliest_dated_usage_otherwise() {
        let resolved = resolve(&[(
            "/t/main.journal",
            "2024-02-01 later\n    assets:cash  1 EUR\n    b\n2024-01-01 earlier\n    assets:cash  1 EUR\n    b\n",
        )]);
        let def = definition(&resolved, &account("assets:cash"));
        // the January usage is on line 5 (1-based), despite appearing later
        assert_eq!(def.map(|(_, s)| s.start.line), Some(5));
    }

    #[test]
    fn commodity_declaration() {
        let resolved = resolve(&[(
            "/t/main.journal",
            "commodity EUR\n2024-01-01 x\n    a  1 EUR\n    b\n",
        )]);
        let element = Element::Commodity { name: "EUR".to_string(), span: Default::default() };
        let def = definition(&resolved, &element);
        assert_eq!(def.map(|(_, s)| s.start.line), Some(1));
    }

    #[test]
    fn payee_definition_is_first_transaction() {
        let resolved = resolve(&[(
            "/t/main.journal",
            "2024-03-01 Shop\n    a  1 EUR\n    b\n2024-01-01 Shop\n    a  1 EUR\n    b\n",
        )]);
        let element = Element::Payee { name: "Shop".to_string(), span: Default::default() };
        let def = definition(&resolved, &element);
        assert_eq!(def.map(|(_, s)| s.start.line), Some(4));
    }
}
