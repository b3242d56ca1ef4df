//! The workspace index: current resolved journal plus memoized analysis.

use crate::discover::discover_root;
use crate::documents::DocumentStore;
use hledger_analysis::{analyze, AnalysisResult};
use hledger_journal::ParserOptions;
use hledger_resolve::{
    canonical_path, FileLoader, LoadFailure, OsFileLoader, ResolveConfig, ResolvedJournal,
    Resolver,
};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loader layering open editor buffers over the filesystem: the editor's
/// unsaved text wins over what is on disk.
pub struct WorkspaceLoader {
    documents: DocumentStore,
    disk: OsFileLoader,
}

impl WorkspaceLoader {
    /// Create a loader backed by the given document store.
    pub fn new(documents: DocumentStore) -> Self {
        WorkspaceLoader { documents, disk: OsFileLoader }
    }
}

impl FileLoader for WorkspaceLoader {
    fn load(&self, path: &Path) -> Result<String, LoadFailure> {
        if let Some(doc) = self.documents.get_by_path(path) {
            return Ok(doc.text);
        }
        self.disk.load(path)
    }
}

/// Exclusive owner of the resolved journal and its analysis.
///
/// A request resolves against the discovered workspace root when the
/// request's file is reachable from it, and against the file itself
/// otherwise, so stand-alone journals still get full analysis. All memos
/// invalidate together on any document change.
pub struct Workspace {
    root_dir: PathBuf,
    root_journal: Option<PathBuf>,
    resolver: Resolver,
    config: ResolveConfig,
    parser_options: Option<ParserOptions>,
    documents: DocumentStore,
    cache: FxHashMap<PathBuf, (Arc<ResolvedJournal>, Arc<AnalysisResult>)>,
}

impl Workspace {
    /// Create a workspace over `root_dir` sharing the given document
    /// store.
    pub fn new(root_dir: PathBuf, documents: DocumentStore) -> Self {
        Workspace {
            root_dir,
            root_journal: None,
            resolver: Resolver::new(),
            config: ResolveConfig::default(),
            parser_options: None,
            documents,
            cache: FxHashMap::default(),
        }
    }

    /// The shared document store.
    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Replace the resolution limits (from settings).
    pub fn set_config(&mut self, config: ResolveConfig) {
        self.config = config;
        self.cache.clear();
        self.resolver.clear();
    }

    /// Pin parser options (tests); production uses the defaults.
    pub fn set_parser_options(&mut self, options: ParserOptions) {
        self.parser_options = Some(options);
        self.cache.clear();
        self.resolver.clear();
    }

    /// Point the workspace at a different root directory (from
    /// `initialize`).
    pub fn set_root_dir(&mut self, root_dir: PathBuf) {
        self.root_dir = root_dir;
        self.root_journal = None;
        self.cache.clear();
        self.resolver.clear();
    }

    /// The analysis of the discovered workspace root, for workspace-wide
    /// requests that are not anchored to a document.
    pub fn primary_analysis(&mut self) -> Option<(Arc<ResolvedJournal>, Arc<AnalysisResult>)> {
        if self.root_journal.is_none() {
            self.root_journal = discover_root(&self.root_dir);
        }
        let root = self.root_journal.clone()?;
        Some(self.resolve_root(root))
    }

    /// Discover (or re-discover) the workspace root journal.
    pub fn rescan(&mut self) {
        self.root_journal = discover_root(&self.root_dir);
        self.cache.clear();
        self.resolver.clear();
    }

    /// Record a text change to `path`: invalidate its cached parse and
    /// every memo, so the next request re-resolves.
    pub fn update_file(&mut self, path: &Path) {
        self.resolver.invalidate(path);
        self.cache.clear();
    }

    /// The resolved journal and analysis serving requests on `path`.
    pub fn analysis_for(&mut self, path: &Path) -> (Arc<ResolvedJournal>, Arc<AnalysisResult>) {
        let canonical = canonical_path(path);

        if self.root_journal.is_none() {
            self.root_journal = discover_root(&self.root_dir);
        }
        if let Some(root) = self.root_journal.clone() {
            let entry = self.resolve_root(root);
            if entry.0.files.contains_key(&canonical) {
                return entry;
            }
        }
        self.resolve_root(canonical)
    }

    fn resolve_root(&mut self, root: PathBuf) -> (Arc<ResolvedJournal>, Arc<AnalysisResult>) {
        if let Some(entry) = self.cache.get(&root) {
            return entry.clone();
        }
        let loader = WorkspaceLoader::new(self.documents.clone());
        let options = self.parser_options.clone().unwrap_or_default();
        let resolved =
            Arc::new(self.resolver.resolve_with(&root, &loader, &self.config, &options));
        let analysis = Arc::new(analyze(&resolved));
        let entry = (resolved, analysis);
        self.cache.insert(root, entry.clone());
        entry
    }
}
