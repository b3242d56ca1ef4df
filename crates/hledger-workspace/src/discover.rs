//! Root-journal discovery.
//!
//! Priority order: the `LEDGER_FILE` / `HLEDGER_JOURNAL` environment
//! variables, then the conventional `main.journal` / `.hledger.journal`
//! names in the workspace root, then a filesystem scan that builds the
//! include graph and picks the lexicographically smallest file nobody
//! includes.

use hledger_resolve::canonical_path;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const JOURNAL_EXTENSIONS: [&str; 4] = ["journal", "j", "hledger", "ledger"];
const EXCLUDED_DIRS: [&str; 6] = [".git", ".hg", ".svn", "node_modules", "vendor", ".cache"];

/// Discover the root journal of a workspace, reading the process
/// environment.
pub fn discover_root(workspace_root: &Path) -> Option<PathBuf> {
    discover_root_with_env(workspace_root, |name| std::env::var(name).ok())
}

/// Discovery with an injectable environment, for tests.
pub fn discover_root_with_env(
    workspace_root: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    for variable in ["LEDGER_FILE", "HLEDGER_JOURNAL"] {
        if let Some(value) = env(variable) {
            if !value.is_empty() {
                let path = PathBuf::from(&value);
                if path.is_file() {
                    return Some(canonical_path(&path));
                }
            }
        }
    }

    for name in ["main.journal", ".hledger.journal"] {
        let candidate = workspace_root.join(name);
        if candidate.is_file() {
            return Some(canonical_path(&candidate));
        }
    }

    scan_for_root(workspace_root)
}

fn scan_for_root(workspace_root: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = WalkDir::new(workspace_root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry
                .file_name()
                .to_str()
                .map_or(true, |name| !EXCLUDED_DIRS.contains(&name))
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map_or(false, |ext| JOURNAL_EXTENSIONS.contains(&ext))
        })
        .map(|entry| canonical_path(entry.path()))
        .collect();
    candidates.sort();
    candidates.dedup();

    if candidates.is_empty() {
        return None;
    }

    // parse each candidate just enough to extract its include edges
    let candidate_set: FxHashSet<&PathBuf> = candidates.iter().collect();
    let mut in_degree: FxHashMap<&PathBuf, usize> =
        candidates.iter().map(|p| (p, 0usize)).collect();
    for candidate in &candidates {
        let Ok(text) = std::fs::read_to_string(candidate) else { continue };
        let journal = hledger_journal::parse(&text);
        let base = candidate.parent().map(Path::to_path_buf).unwrap_or_default();
        for include in &journal.includes {
            let target = canonical_path(&base.join(&include.path));
            if let Some(&key) = candidate_set.get(&target) {
                *in_degree.entry(key).or_insert(0) += 1;
            }
        }
    }

    candidates
        .iter()
        .find(|p| in_degree.get(*p).copied().unwrap_or(0) == 0)
        .or_else(|| candidates.first())
        .cloned()
}
