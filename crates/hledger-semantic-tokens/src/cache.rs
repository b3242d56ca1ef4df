//! Process-wide semantic-token result cache.
//!
//! Full responses are cached per URI under a result id so
//! `semanticTokens/full/delta` can answer with a minimal edit. The cache
//! is cleared per URI on `didClose` and wholesale on workspace rescans.

use crate::{collect_tokens, encode};
use hledger_journal::Journal;
use lsp_types::{
    Range, SemanticToken, SemanticTokens, SemanticTokensDelta, SemanticTokensEdit,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct CachedResult {
    result_id: String,
    data: Vec<SemanticToken>,
}

/// Cache of the last full token response per document.
#[derive(Debug, Default)]
pub struct TokenCache {
    results: RwLock<FxHashMap<String, CachedResult>>,
    next_id: AtomicU64,
}

impl TokenCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the full token set for a document and cache it.
    pub fn full(&self, uri: &str, journal: &Journal) -> SemanticTokens {
        let data = encode(&collect_tokens(journal));
        let result_id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        self.results.write().insert(
            uri.to_string(),
            CachedResult { result_id: result_id.clone(), data: data.clone() },
        );
        SemanticTokens { result_id: Some(result_id), data }
    }

    /// Answer a delta request against the previous full response.
    ///
    /// Returns `Err` with a fresh full response when the previous result
    /// id is unknown (cache cleared or out of sync).
    pub fn full_delta(
        &self,
        uri: &str,
        journal: &Journal,
        previous_result_id: &str,
    ) -> Result<SemanticTokensDelta, SemanticTokens> {
        let previous = {
            let results = self.results.read();
            match results.get(uri) {
                Some(cached) if cached.result_id == previous_result_id => {
                    Some(cached.data.clone())
                }
                _ => None,
            }
        };
        let Some(previous) = previous else {
            return Err(self.full(uri, journal));
        };

        let fresh = self.full(uri, journal);
        let new_data = fresh.data;
        let result_id = fresh.result_id;

        // shared prefix and suffix, in whole tokens
        let mut prefix = 0usize;
        while prefix < previous.len()
            && prefix < new_data.len()
            && previous[prefix] == new_data[prefix]
        {
            prefix += 1;
        }
        let mut suffix = 0usize;
        while suffix < previous.len() - prefix
            && suffix < new_data.len() - prefix
            && previous[previous.len() - 1 - suffix] == new_data[new_data.len() - 1 - suffix]
        {
            suffix += 1;
        }

        let replaced = new_data[prefix..new_data.len() - suffix].to_vec();
        let deleted = previous.len() - prefix - suffix;
        let edits = if replaced.is_empty() && deleted == 0 {
            Vec::new()
        } else {
            // start and delete_count address the flat integer array
            vec![SemanticTokensEdit {
                start: (prefix * 5) as u32,
                delete_count: (deleted * 5) as u32,
                data: Some(replaced),
            }]
        };
        Ok(SemanticTokensDelta { result_id, edits })
    }

    /// Tokens restricted to a line range; not cached.
    pub fn range(&self, journal: &Journal, range: &Range) -> SemanticTokens {
        let tokens: Vec<_> = collect_tokens(journal)
            .into_iter()
            .filter(|t| t.line >= range.start.line && t.line <= range.end.line)
            .collect();
        SemanticTokens { result_id: None, data: encode(&tokens) }
    }

    /// Drop the cached result for one document.
    pub fn evict(&self, uri: &str) {
        self.results.write().remove(uri);
    }

    /// Drop everything (workspace rescan).
    pub fn clear(&self) {
        self.results.write().clear();
    }
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
    fn full_then_identical_delta_is_empty() {
        let cache = TokenCache::new();
        let j = journal("2024-01-01 x\n    a  1 EUR\n    b\n");
        let full = cache.full("file:///t/a", &j);
        let Some(id) = full.result_id else { panic!("expected a result id") };
        let delta = cache.full_delta("file:///t/a", &j, &id);
        match delta {
            Ok(delta) => assert_eq!(delta.edits, vec![]),
            Err(_) => panic!("expected a delta"),
        }
    }

    #[test]
    fn changed_document_yields_one_edit() {
        let cache = TokenCache::new();
        let before = journal("2024-01-01 x\n    a  1 EUR\n    b\n");
        let after = journal("2024-01-01 x\n    a  2 EUR\n    b\n");
        let full = cache.full("file:///t/a", &before);
        let Some(id) = full.result_id else { panic!("expected a result id") };
        match cache.full_delta("file:///t/a", &after, &id) {
            Ok(delta) => {
                assert_eq!(delta.edits.len(), 1);
                assert_eq!(delta.edits[0].start % 5, 0);
            }
            Err(_) => panic!("expected a delta"),
        }
    }

    #[test]
    fn unknown_result_id_falls_back_to_full() {
        let cache = TokenCache::new();
        let j = journal("2024-01-01 x\n    a  1 EUR\n    b\n");
        assert!(cache.full_delta("file:///t/a", &j, "stale").is_err());
    }

    #[test]
    fn range_filters_lines() {
        let cache = TokenCache::new();
        let j = journal("2024-01-01 x\n    a  1 EUR\n    b\n2024-01-02 y\n    a  1 EUR\n    b\n");
        let range = Range {
            start: lsp_types::Position { line: 0, character: 0 },
            end: lsp_types::Position { line: 2, character: 0 },
        };
        let limited = cache.range(&j, &range);
        let full = cache.full("file:///t/a", &j);
        assert!(limited.data.len() < full.data.len());
        assert!(!limited.data.is_empty());
    }

    #[test]
    fn evict_forgets_the_result_id() {
        let cache = TokenCache::new();
        let j = journal("2024-01-01 x\n    a  1 EUR\n    b\n");
        let full = cache.full("file:///t/a", &j);
        cache.evict("file:///t/a");
        let Some(id) = full.result_id else { panic!("expected a result id") };
        assert!(cache.full_delta("file:///t/a", &j, &id).is_err());
    }
}
