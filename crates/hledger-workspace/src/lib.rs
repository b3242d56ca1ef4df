//! Workspace state: open documents, root-journal discovery and the
//! resolved-journal index every feature reads from.

#![deny(unsafe_code)]

mod discover;
mod documents;
mod uri;
mod workspace;

pub use discover::{discover_root, discover_root_with_env};
pub use documents::{Document, DocumentStore};
pub use uri::{path_to_uri, uri_to_path};
pub use workspace::{Workspace, WorkspaceLoader};
