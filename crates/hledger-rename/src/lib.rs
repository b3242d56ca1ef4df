//! Rename: references-backed workspace edits.
//!
//! Rename reuses the reference search, so the edit set and the
//! find-all-references result can never drift apart. Declaration sites
//! are always included: renaming an account must rename its `account`
//! directive too.

#![deny(unsafe_code)]

use hledger_navigation::{element_at, references, span_to_range, Element};
use hledger_resolve::ResolvedJournal;
use lsp_types::{Range, TextEdit, Url, WorkspaceEdit};
use std::collections::HashMap;
use std::path::Path;

/// The renameable region at a cursor, for `textDocument/prepareRename`.
///
/// Only named elements can be renamed; amounts and dates cannot.
pub fn prepare_rename(resolved: &ResolvedJournal, path: &Path, byte: usize) -> Option<Range> {
    let journal = resolved.files.get(path)?;
    let element = element_at(journal, byte)?;
    match element {
        Element::Account { span, .. }
        | Element::Commodity { span, .. }
        | Element::Payee { span, .. }
        | Element::TagName { span, .. }
        | Element::TagValue { span, .. } => Some(span_to_range(span)),
        Element::Amount { .. } => None,
    }
}

/// Build the workspace edit renaming the element at a cursor to
/// `new_name`: one text edit per reference, declaration sites included.
pub fn rename(
    resolved: &ResolvedJournal,
    path: &Path,
    byte: usize,
    new_name: &str,
) -> Option<WorkspaceEdit> {
    let journal = resolved.files.get(path)?;
    let element = element_at(journal, byte)?;
    if matches!(element, Element::Amount { .. }) {
        return None;
    }

    let locations = references(resolved, &element, true);
    if locations.is_empty() {
        return None;
    }

    let mut changes: HashMap<Url, Vec<TextEdit>> = HashMap::new();
    for (file, span) in locations {
        let uri = Url::from_file_path(&file).ok()?;
        changes.entry(uri).or_default().push(TextEdit {
            range: span_to_range(span),
            new_text: new_name.to_string(),
        });
    }
    Some(WorkspaceEdit { changes: Some(changes), ..Default::default() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hledger_journal::ParserOptions;
    use hledger_resolve::{FileLoader, LoadFailure, ResolveConfig, Resolver};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

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

    #[test]
    fn rename_touches_every_file_and_the_declaration() {
        let main = "include sub.journal\naccount expenses:food\n2024-01-01 x\n    expenses:food  1 EUR\n    b\n";
        let resolved = resolve(&[
            ("/t/main.journal", main),
            ("/t/sub.journal", "2024-01-02 y\n    expenses:food  2 EUR\n    b\n"),
        ]);
        let offset = main.find("expenses:food").unwrap_or(0) + 3;
        let edit = rename(&resolved, Path::new("/t/main.journal"), offset, "expenses:groceries");
        let Some(WorkspaceEdit { changes: Some(changes), .. }) = edit else {
            panic!("expected changes");
        };
        assert_eq!(changes.len(), 2);
        let total: usize = changes.values().map(Vec::len).sum();
        assert_eq!(total, 3);
        assert!(changes
            .values()
            .flatten()
            .all(|e| e.new_text == "expenses:groceries"));
    }

    #[test]
    fn prepare_rename_returns_the_element_range() {
        let src = "2024-01-01 x\n    expenses:food  1 EUR\n    b\n";
        let resolved = resolve(&[("/t/main.journal", src)]);
        let offset = src.find("expenses").unwrap_or(0);
        let range = prepare_rename(&resolved, Path::new("/t/main.journal"), offset);
        let Some(range) = range else { panic!("expected a range") };
        assert_eq!(range.start.character, 4);
        assert_eq!(range.end.character, 17);
    }

    #[test]
    fn amounts_are_not_renameable() {
        let src = "2024-01-01 x\n    a  10 EUR\n    b\n";
        let resolved = resolve(&[("/t/main.journal", src)]);
        let offset = src.find("10").unwrap_or(0);
        assert_eq!(prepare_rename(&resolved, Path::new("/t/main.journal"), offset), None);
    }
}
