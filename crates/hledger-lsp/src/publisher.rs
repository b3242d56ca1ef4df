//! Background diagnostics publication, serialized per URI.
//!
//! Jobs flow through a channel to one worker thread, so publications for
//! a document happen in submission order and diagnostics for version N
//! can never land after version N+1. A stale job (its version already
//! superseded) is dropped instead of published.
//!
//! A job publishes for its own document and for every other file of the
//! resolved workspace that carries diagnostics; a cycle error belongs
//! to the include directive that closes the cycle, which may sit in a
//! file the user has not opened.

use crate::state::settings::Settings;
use hledger_diagnostics::diagnostics_for_file;
use hledger_protocol::methods;
use hledger_resolve::canonical_path;
use hledger_workspace::{path_to_uri, uri_to_path, DocumentStore, Workspace};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use std::io::Write;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

pub(crate) type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

#[derive(Debug)]
struct Job {
    uri: String,
    version: Option<i32>,
    /// true for a didClose: publish an empty set, skipping analysis
    clear: bool,
}

/// Handle for scheduling diagnostic publications.
pub(crate) struct Publisher {
    sender: mpsc::Sender<Job>,
}

impl Publisher {
    /// Start the worker thread.
    pub(crate) fn spawn(
        workspace: Arc<RwLock<Workspace>>,
        settings: Arc<RwLock<Settings>>,
        documents: DocumentStore,
        writer: SharedWriter,
    ) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        thread::Builder::new()
            .name("diagnostics-publisher".to_string())
            .spawn(move || worker(receiver, workspace, settings, documents, writer))
            .ok();
        Publisher { sender }
    }

    /// Queue a publish for a document version.
    pub(crate) fn schedule(&self, uri: String, version: Option<i32>) {
        let _ = self.sender.send(Job { uri, version, clear: false });
    }

    /// Queue an empty publish (document closed).
    pub(crate) fn clear(&self, uri: String) {
        let _ = self.sender.send(Job { uri, version: None, clear: true });
    }
}

fn worker(
    receiver: mpsc::Receiver<Job>,
    workspace: Arc<RwLock<Workspace>>,
    settings: Arc<RwLock<Settings>>,
    documents: DocumentStore,
    writer: SharedWriter,
) {
    let mut published: FxHashMap<String, i32> = FxHashMap::default();
    while let Ok(job) = receiver.recv() {
        if let (Some(version), Some(last)) = (job.version, published.get(&job.uri)) {
            if version < *last {
                tracing::debug!(uri = %job.uri, version, "skipping stale diagnostics");
                continue;
            }
        }

        let batch = if job.clear {
            vec![(job.uri.clone(), job.version, Vec::new())]
        } else {
            compute(&workspace, &settings, &documents, &job.uri, job.version)
        };

        for (uri, version, diagnostics) in batch {
            let params = serde_json::json!({
                "uri": uri,
                "diagnostics": diagnostics,
                "version": version,
            });
            let mut writer = writer.lock();
            if let Err(err) = hledger_transport::write_notification(
                &mut *writer,
                methods::PUBLISH_DIAGNOSTICS,
                params,
            ) {
                tracing::warn!(error = %err, "failed to publish diagnostics");
            }
        }

        if job.clear {
            published.remove(&job.uri);
        } else if let Some(version) = job.version {
            published.insert(job.uri.clone(), version);
        }
    }
}

type Publication = (String, Option<i32>, Vec<lsp_types::Diagnostic>);

fn compute(
    workspace: &Arc<RwLock<Workspace>>,
    settings: &Arc<RwLock<Settings>>,
    documents: &DocumentStore,
    uri: &str,
    version: Option<i32>,
) -> Vec<Publication> {
    let (enabled, filter) = {
        let settings = settings.read();
        (settings.features.diagnostics, settings.diagnostics.clone())
    };
    let Some(path) = uri_to_path(uri) else {
        return Vec::new();
    };
    let canonical = canonical_path(&path);
    if !enabled {
        return vec![(uri.to_string(), version, Vec::new())];
    }

    let (resolved, analysis) = workspace.write().analysis_for(&canonical);

    let mut out: Vec<Publication> =
        vec![(uri.to_string(), version, diagnostics_for_file(&analysis.diagnostics, &canonical, &filter))];

    // other workspace files that carry findings (e.g. the include
    // directive closing a cycle)
    let mut extra_paths: FxHashSet<&std::path::PathBuf> = FxHashSet::default();
    for diagnostic in &analysis.diagnostics {
        if diagnostic.path != canonical && resolved.files.contains_key(&diagnostic.path) {
            extra_paths.insert(&diagnostic.path);
        }
    }
    for extra in extra_paths {
        let Some(extra_uri) = path_to_uri(extra) else { continue };
        let extra_version = documents.get(&extra_uri).map(|d| d.version);
        out.push((
            extra_uri,
            extra_version,
            diagnostics_for_file(&analysis.diagnostics, extra, &filter),
        ));
    }
    out
}
