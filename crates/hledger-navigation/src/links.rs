//! Document links for `include` directives.

use crate::span_to_range;
use hledger_journal::Journal;
use hledger_resolve::canonical_path;
use lsp_types::{DocumentLink, Url};
use std::path::Path;

/// Convert a path to a `file:` URL.
pub(crate) fn file_uri(path: &Path) -> Option<Url> {
    Url::from_file_path(path).ok()
}

/// A link from each include directive's path token to the resolved
/// absolute URI of the target file.
pub fn document_links(journal: &Journal, file_path: &Path) -> Vec<DocumentLink> {
    let base = file_path.parent().map(Path::to_path_buf).unwrap_or_default();
    journal
        .includes
        .iter()
        .filter_map(|include| {
            let target = canonical_path(&base.join(&include.path));
            Some(DocumentLink {
                range: span_to_range(include.path_span),
                target: Some(file_uri(&target)?),
                tooltip: None,
                data: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hledger_journal::{parse_with, ParserOptions};
    use pretty_assertions::assert_eq;

    #[test]
    fn links_resolve_relative_to_the_including_file() {
        let journal = parse_with(
            "include sub/other.journal\n",
            &ParserOptions { fallback_year: 2024 },
        );
        let links = document_links(&journal, Path::new("/books/main.journal"));
        assert_eq!(links.len(), 1);
        assert_eq!(
            links[0].target.as_ref().map(|u| u.path().to_string()),
            Some("/books/sub/other.journal".to_string())
        );
        // the link range covers the path token only
        assert_eq!(links[0].range.start.character, 8);
        assert_eq!(links[0].range.end.character, 25);
    }
}
