//! Depth-first include resolution with a per-file parse cache.

use crate::error::{IncludeSite, LoadError, LoadErrorKind};
use crate::loader::{FileLoader, LoadFailure};
use crate::paths::canonical_path;
use hledger_journal::{parse_with, Journal, ParserOptions};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Limits applied while loading files.
#[derive(Debug, Clone)]
pub struct ResolveConfig {
    /// Maximum file size in bytes (default 10 MiB)
    pub max_file_size: u64,
    /// Maximum include nesting depth (default 32)
    pub max_include_depth: usize,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        ResolveConfig { max_file_size: 10 * 1024 * 1024, max_include_depth: 32 }
    }
}

/// The transitive composition of a root journal with all its includes.
///
/// `files` holds one entry per canonical path no matter how many include
/// edges pointed at it. `include_order` is the pre-order traversal with
/// duplicates elided; downstream "first declaration wins" semantics follow
/// this order.
#[derive(Debug, Clone, Default)]
pub struct ResolvedJournal {
    /// Canonical path of the root journal
    pub primary_path: PathBuf,
    /// Parsed file per canonical path
    pub files: BTreeMap<PathBuf, Arc<Journal>>,
    /// Deterministic depth-first visit order
    pub include_order: Vec<PathBuf>,
    /// Failures encountered while loading; resolution continues past them
    pub load_errors: Vec<LoadError>,
}

impl ResolvedJournal {
    /// Iterate files in include order.
    pub fn files_in_order(&self) -> impl Iterator<Item = (&PathBuf, &Arc<Journal>)> {
        self.include_order.iter().filter_map(|p| self.files.get_key_value(p))
    }
}

/// Include resolver with a cache of parsed files.
///
/// The cache is guarded by a reader-writer lock: concurrent resolutions
/// share read access, invalidation takes the write lock briefly.
#[derive(Default)]
pub struct Resolver {
    cache: RwLock<FxHashMap<PathBuf, Arc<Journal>>>,
    reverse: RwLock<FxHashMap<PathBuf, FxHashSet<PathBuf>>>,
}

impl Resolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the workspace rooted at `root_path`.
    pub fn resolve(
        &self,
        root_path: &Path,
        loader: &dyn FileLoader,
        config: &ResolveConfig,
    ) -> ResolvedJournal {
        self.resolve_with(root_path, loader, config, &ParserOptions::default())
    }

    /// Resolve with explicit parser options (deterministic for tests).
    pub fn resolve_with(
        &self,
        root_path: &Path,
        loader: &dyn FileLoader,
        config: &ResolveConfig,
        parser_options: &ParserOptions,
    ) -> ResolvedJournal {
        let root = canonical_path(root_path);
        let mut resolved = ResolvedJournal { primary_path: root.clone(), ..Default::default() };
        let mut on_stack = FxHashSet::default();
        let mut reverse: FxHashMap<PathBuf, FxHashSet<PathBuf>> = FxHashMap::default();

        self.visit(
            root,
            None,
            0,
            loader,
            config,
            parser_options,
            &mut resolved,
            &mut on_stack,
            &mut reverse,
        );

        *self.reverse.write() = reverse;
        resolved
    }

    #[allow(clippy::too_many_arguments)]
    fn visit(
        &self,
        path: PathBuf,
        site: Option<IncludeSite>,
        depth: usize,
        loader: &dyn FileLoader,
        config: &ResolveConfig,
        parser_options: &ParserOptions,
        resolved: &mut ResolvedJournal,
        on_stack: &mut FxHashSet<PathBuf>,
        reverse: &mut FxHashMap<PathBuf, FxHashSet<PathBuf>>,
    ) {
        // cycle check first: a path on the stack is already in `files`
        if on_stack.contains(&path) {
            resolved.load_errors.push(LoadError {
                kind: LoadErrorKind::CycleDetected,
                path,
                site,
            });
            return;
        }
        // diamond includes: first visit wins, later edges are elided
        if resolved.files.contains_key(&path) {
            return;
        }
        if depth > config.max_include_depth {
            resolved.load_errors.push(LoadError {
                kind: LoadErrorKind::TooDeep(config.max_include_depth),
                path,
                site,
            });
            return;
        }

        let cached = self.cache.read().get(&path).cloned();
        let journal = match cached {
            Some(journal) => journal,
            None => {
                let text = match loader.load(&path) {
                    Ok(text) => text,
                    Err(failure) => {
                        let kind = match failure {
                            LoadFailure::NotFound | LoadFailure::Io(_) => {
                                LoadErrorKind::FileNotFound
                            }
                            LoadFailure::Encoding => LoadErrorKind::EncodingError,
                        };
                        resolved.load_errors.push(LoadError { kind, path, site });
                        return;
                    }
                };
                if text.len() as u64 > config.max_file_size {
                    resolved.load_errors.push(LoadError {
                        kind: LoadErrorKind::FileTooLarge {
                            size: text.len() as u64,
                            limit: config.max_file_size,
                        },
                        path,
                        site,
                    });
                    return;
                }
                let journal = Arc::new(parse_with(&text, parser_options));
                self.cache.write().insert(path.clone(), journal.clone());
                journal
            }
        };

        resolved.files.insert(path.clone(), journal.clone());
        resolved.include_order.push(path.clone());
        on_stack.insert(path.clone());

        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        for include in &journal.includes {
            let target = canonical_path(&base_dir.join(&include.path));
            reverse.entry(target.clone()).or_default().insert(path.clone());
            self.visit(
                target,
                Some(IncludeSite { path: path.clone(), span: include.path_span }),
                depth + 1,
                loader,
                config,
                parser_options,
                resolved,
                on_stack,
                reverse,
            );
        }

        on_stack.remove(&path);
    }

    /// Drop the cached parse for `path` after its text changed.
    pub fn invalidate(&self, path: &Path) {
        let canonical = canonical_path(path);
        self.cache.write().remove(&canonical);
    }

    /// All files that transitively include `path`, per the reverse-include
    /// graph of the last resolution. Used to decide whether a change to a
    /// file requires re-resolving a given root.
    pub fn dependents(&self, path: &Path) -> FxHashSet<PathBuf> {
        let canonical = canonical_path(path);
        let reverse = self.reverse.read();
        let mut out = FxHashSet::default();
        let mut queue = vec![canonical];
        while let Some(current) = queue.pop() {
            if let Some(includers) = reverse.get(&current) {
                for includer in includers {
                    if out.insert(includer.clone()) {
                        queue.push(includer.clone());
                    }
                }
            }
        }
        out
    }

    /// Forget every cached parse (workspace rescan).
    pub fn clear(&self) {
        self.cache.write().clear();
        self.reverse.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct MapLoader(FxHashMap<PathBuf, String>);

    impl MapLoader {
        fn new(files: &[(&str, &str)]) -> Self {
            MapLoader(
                files
                    .iter()
                    .map(|(path, text)| (PathBuf::from(path), text.to_string()))
                    .collect(),
            )
        }
    }

    impl FileLoader for MapLoader {
        fn load(&self, path: &Path) -> Result<String, LoadFailure> {
            self.0.get(path).cloned().ok_or(LoadFailure::NotFound)
        }
    }

    fn parser_options() -> ParserOptions {
        ParserOptions { fallback_year: 2024 }
    }

    #[test]
    fn resolves_nested_includes_in_preorder() {
        let loader = MapLoader::new(&[
            ("/ws/main.journal", "include a.journal\ninclude b.journal\n"),
            ("/ws/a.journal", "include sub/c.journal\n"),
            ("/ws/b.journal", "2024-01-01 b\n"),
            ("/ws/sub/c.journal", "2024-01-01 c\n"),
        ]);
        let resolver = Resolver::new();
        let resolved = resolver.resolve_with(
            Path::new("/ws/main.journal"),
            &loader,
            &ResolveConfig::default(),
            &parser_options(),
        );
        assert_eq!(resolved.load_errors, vec![]);
        assert_eq!(
            resolved.include_order,
            vec![
                PathBuf::from("/ws/main.journal"),
                PathBuf::from("/ws/a.journal"),
                PathBuf::from("/ws/sub/c.journal"),
                PathBuf::from("/ws/b.journal"),
            ]
        );
        assert_eq!(resolved.files.len(), 4);
    }

    #[test]
    fn diamond_includes_are_elided() {
        let loader = MapLoader::new(&[
            ("/ws/main.journal", "include a.journal\ninclude b.journal\n"),
            ("/ws/a.journal", "include shared.journal\n"),
            ("/ws/b.journal", "include shared.journal\n"),
            ("/ws/shared.journal", "account x\n"),
        ]);
        let resolver = Resolver::new();
        let resolved = resolver.resolve_with(
            Path::new("/ws/main.journal"),
            &loader,
            &ResolveConfig::default(),
            &parser_options(),
        );
        assert_eq!(resolved.load_errors, vec![]);
        let shared =
            resolved.include_order.iter().filter(|p| p.ends_with("shared.journal")).count();
        assert_eq!(shared, 1);
    }

    #[test]
    fn cycle_is_reported_on_the_closing_edge() {
        let loader = MapLoader::new(&[
            ("/ws/a.journal", "account from-a\ninclude b.journal\n"),
            ("/ws/b.journal", "account from-b\ninclude a.journal\n"),
        ]);
        let resolver = Resolver::new();
        let resolved = resolver.resolve_with(
            Path::new("/ws/a.journal"),
            &loader,
            &ResolveConfig::default(),
            &parser_options(),
        );
        assert_eq!(resolved.load_errors.len(), 1);
        let error = &resolved.load_errors[0];
        assert_eq!(error.kind, LoadErrorKind::CycleDetected);
        // the edge that closes the cycle sits in b.journal
        assert_eq!(
            error.site.as_ref().map(|s| s.path.clone()),
            Some(PathBuf::from("/ws/b.journal"))
        );
        // both files still contribute their declarations
        assert_eq!(resolved.files.len(), 2);
    }

    #[test]
    fn missing_file_is_an_error_and_siblings_continue() {
        let loader = MapLoader::new(&[
            ("/ws/main.journal", "include gone.journal\ninclude b.journal\n"),
            ("/ws/b.journal", "account b\n"),
        ]);
        let resolver = Resolver::new();
        let resolved = resolver.resolve_with(
            Path::new("/ws/main.journal"),
            &loader,
            &ResolveConfig::default(),
            &parser_options(),
        );
        assert_eq!(resolved.load_errors.len(), 1);
        assert_eq!(resolved.load_errors[0].kind, LoadErrorKind::FileNotFound);
        assert!(resolved.files.contains_key(Path::new("/ws/b.journal")));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let loader = MapLoader::new(&[("/ws/main.journal", "2024-01-01 x\n")]);
        let resolver = Resolver::new();
        let config = ResolveConfig { max_file_size: 4, ..Default::default() };
        let resolved = resolver.resolve_with(
            Path::new("/ws/main.journal"),
            &loader,
            &config,
            &parser_options(),
        );
        assert!(matches!(
            resolved.load_errors.first().map(|e| &e.kind),
            Some(LoadErrorKind::FileTooLarge { .. })
        ));
        assert!(resolved.files.is_empty());
    }

    #[test]
    fn cache_survives_until_invalidation() {
        let loader = MapLoader::new(&[("/ws/main.journal", "2024-01-01 first\n")]);
        let resolver = Resolver::new();
        let config = ResolveConfig::default();
        let first = resolver.resolve_with(
            Path::new("/ws/main.journal"),
            &loader,
            &config,
            &parser_options(),
        );

        // the loader now returns different text, but the cache still wins
        let changed = MapLoader::new(&[("/ws/main.journal", "2024-01-01 second\n")]);
        let cached = resolver.resolve_with(
            Path::new("/ws/main.journal"),
            &changed,
            &config,
            &parser_options(),
        );
        let payee =
            |r: &ResolvedJournal| r.files.values().next().map(|j| j.transactions[0].payee.clone());
        assert_eq!(payee(&first), payee(&cached));

        resolver.invalidate(Path::new("/ws/main.journal"));
        let fresh = resolver.resolve_with(
            Path::new("/ws/main.journal"),
            &changed,
            &config,
            &parser_options(),
        );
        assert_eq!(payee(&fresh), Some(Some("second".to_string())));
    }

    #[test]
    fn dependents_follow_reverse_edges() {
        let loader = MapLoader::new(&[
            ("/ws/main.journal", "include mid.journal\n"),
            ("/ws/mid.journal", "include leaf.journal\n"),
            ("/ws/leaf.journal", "account x\n"),
        ]);
        let resolver = Resolver::new();
        resolver.resolve_with(
            Path::new("/ws/main.journal"),
            &loader,
            &ResolveConfig::default(),
            &parser_options(),
        );
        let dependents = resolver.dependents(Path::new("/ws/leaf.journal"));
        assert!(dependents.contains(Path::new("/ws/mid.journal")));
        assert!(dependents.contains(Path::new("/ws/main.journal")));
        assert!(resolver.dependents(Path::new("/ws/main.journal")).is_empty());
    }

    #[test]
    fn depth_limit_is_enforced() {
        let loader = MapLoader::new(&[
            ("/ws/a.journal", "include b.journal\n"),
            ("/ws/b.journal", "include c.journal\n"),
            ("/ws/c.journal", "account deep\n"),
        ]);
        let resolver = Resolver::new();
        let config = ResolveConfig { max_include_depth: 1, ..Default::default() };
        let resolved = resolver.resolve_with(
            Path::new("/ws/a.journal"),
            &loader,
            &config,
            &parser_options(),
        );
        assert!(matches!(
            resolved.load_errors.first().map(|e| &e.kind),
            Some(LoadErrorKind::TooDeep(1))
        ));
        assert!(!resolved.files.contains_key(Path::new("/ws/c.journal")));
    }
}
