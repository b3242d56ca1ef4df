//! The hledger language server: request orchestration over the analysis
//! pipeline.
//!
//! The server owns the document store, the workspace index, the settings
//! and the semantic-token cache. Requests dispatch synchronously against
//! the current analysis; diagnostics publish from a background thread,
//! serialized per document so stale versions never overwrite fresh ones.

#![deny(unsafe_code)]

mod dispatch;
mod handlers;
mod params;
mod publisher;
mod server;
mod state;
mod text_sync;

pub use server::LspServer;
pub use state::settings::Settings;
