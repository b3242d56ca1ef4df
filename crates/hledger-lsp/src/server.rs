//! The server: state, lifecycle and the stdio loop.

use crate::publisher::{Publisher, SharedWriter};
use crate::state::settings::Settings;
use hledger_protocol::{methods, JsonRpcResponse};
use hledger_semantic_tokens::TokenCache;
use hledger_transport::{read_message, write_message};
use hledger_workspace::{DocumentStore, Workspace};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashSet;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// The hledger language server.
pub struct LspServer {
    pub(crate) documents: DocumentStore,
    pub(crate) workspace: Arc<RwLock<Workspace>>,
    pub(crate) settings: Arc<RwLock<Settings>>,
    pub(crate) token_cache: Arc<TokenCache>,
    pub(crate) publisher: Publisher,
    pub(crate) cancelled: Arc<Mutex<FxHashSet<String>>>,
    pub(crate) writer: SharedWriter,
    pub(crate) snippet_support: bool,
    pub(crate) initialized: bool,
    pub(crate) shutdown_requested: bool,
}

impl LspServer {
    /// Create a server rooted at the process working directory, talking
    /// on stdout.
    pub fn new() -> Self {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_writer(root, Box::new(io::stdout()))
    }

    /// Create a server with an explicit root directory and output sink
    /// (tests use an in-memory sink).
    pub fn with_writer(root_dir: PathBuf, writer: Box<dyn Write + Send>) -> Self {
        let documents = DocumentStore::new();
        let workspace = Arc::new(RwLock::new(Workspace::new(root_dir, documents.clone())));
        let settings = Arc::new(RwLock::new(Settings::default()));
        let writer: SharedWriter = Arc::new(Mutex::new(writer));
        let publisher =
            Publisher::spawn(workspace.clone(), settings.clone(), documents.clone(), writer.clone());
        LspServer {
            documents,
            workspace,
            settings,
            token_cache: Arc::new(TokenCache::new()),
            publisher,
            cancelled: Arc::new(Mutex::new(FxHashSet::default())),
            writer,
            snippet_support: false,
            initialized: false,
            shutdown_requested: false,
        }
    }

    /// Serve stdio until the client sends `exit`. Returns the process
    /// exit code.
    pub fn run(&mut self) -> io::Result<i32> {
        let mut reader = BufReader::new(io::stdin());
        self.run_with_reader(&mut reader)
    }

    /// Serve from any buffered reader (tests drive this directly).
    pub fn run_with_reader<R: BufRead>(&mut self, reader: &mut R) -> io::Result<i32> {
        loop {
            let Some(request) = read_message(reader)? else {
                // EOF without `exit`: abnormal shutdown
                tracing::info!("client closed the stream");
                return Ok(1);
            };
            if request.method == methods::EXIT {
                return Ok(if self.shutdown_requested { 0 } else { 1 });
            }
            if let Some(response) = self.handle_request(request) {
                let mut writer = self.writer.lock();
                write_message(&mut *writer, &response)?;
            }
        }
    }

    /// Send one response (used by tests that bypass the loop).
    pub fn respond(&self, response: &JsonRpcResponse) -> io::Result<()> {
        let mut writer = self.writer.lock();
        write_message(&mut *writer, response)
    }

    pub(crate) fn mark_cancelled(&self, id: &serde_json::Value) {
        self.cancelled.lock().insert(id.to_string());
    }

    pub(crate) fn is_cancelled(&self, id: Option<&serde_json::Value>) -> bool {
        match id {
            Some(id) => self.cancelled.lock().contains(&id.to_string()),
            None => false,
        }
    }

    pub(crate) fn finish_request(&self, id: Option<&serde_json::Value>) {
        if let Some(id) = id {
            self.cancelled.lock().remove(&id.to_string());
        }
    }
}

impl Default for LspServer {
    fn default() -> Self {
        Self::new()
    }
}
