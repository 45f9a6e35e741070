// SSHE — Store Module
//
// Node records (ip, username, encrypted password, tags) and the tag index
// derived from them, persisted as a single YAML document.

mod document;
mod error;
mod models;
mod repository;

#[cfg(test)]
pub use document::mock;
pub use document::{NodeBackend, YamlFile};
pub use error::StoreError;
pub use models::{node_ref, Node, NodeSummary, NodesFile, TagIndex};
pub use repository::NodeStore;
