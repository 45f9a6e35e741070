// SSHE — Node Document Persistence
//
// Loads and saves node.yaml. Saves are atomic: the document is written to a
// temporary file in the same directory, synced, and renamed over the target,
// so a failed write never leaves a half-written store behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::models::NodesFile;
use super::StoreError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Where the node document lives. The file implementation is used by the
/// CLI; tests substitute an in-memory backend.
pub trait NodeBackend {
    /// Load the document, creating an empty one if none exists yet.
    fn load(&self) -> Result<NodesFile, StoreError>;

    /// Replace the persisted document with `doc`.
    fn save(&self, doc: &NodesFile) -> Result<(), StoreError>;
}

// ─── YAML File ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct YamlFile {
    path: PathBuf,
}

impl YamlFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn write_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl NodeBackend for YamlFile {
    fn load(&self) -> Result<NodesFile, StoreError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "No nodes file found, creating an empty one");
            let doc = NodesFile::default();
            self.save(&doc)?;
            return Ok(doc);
        }

        let contents = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;

        if contents.trim().is_empty() {
            return Ok(NodesFile::default());
        }

        let doc: NodesFile =
            serde_yaml::from_str(&contents).map_err(|source| StoreError::Decode {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            path = %self.path.display(),
            nodes = doc.nodes.len(),
            tags = doc.tag_index.len(),
            "Loaded nodes file"
        );
        Ok(doc)
    }

    fn save(&self, doc: &NodesFile) -> Result<(), StoreError> {
        let contents = serde_yaml::to_string(doc)?;

        let mut tmp = NamedTempFile::new_in(self.parent_dir()).map_err(|e| self.write_err(e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| self.write_err(e))?;
        tmp.as_file().sync_all().map_err(|e| self.write_err(e))?;
        tmp.persist(&self.path).map_err(|e| self.write_err(e.error))?;

        tracing::debug!(path = %self.path.display(), nodes = doc.nodes.len(), "Nodes file written");
        Ok(())
    }
}

// ─── In-Memory Mock for Testing ──────────────────────────────────────────────


// ─── Tests ───────────────────────────────────────────────────────────────────
