//! Edge list provider
//!
//! The edge list is a JSON array of base addresses. It is read fresh on every
//! cycle so operators can add or remove edges without restarting the daemon.

use super::content::EdgeAddress;
use crate::{EdgeVertexError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Source of the ordered list of edges to poll
pub trait EdgeListSource: Send + Sync {
    /// Read the current edge list
    fn read(&self) -> Result<Vec<EdgeAddress>>;
}

/// Edge list backed by a JSON file on disk
#[derive(Debug, Clone)]
pub struct EdgeListFile {
    path: PathBuf,
}

impl EdgeListFile {
    /// Open an edge list file, failing if it does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(EdgeVertexError::Config(format!(
                "Edge list file {} does not exist",
                path.display()
            )));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn list_error(&self, message: impl Into<String>) -> EdgeVertexError {
        EdgeVertexError::EdgeList {
            path: self.path.clone(),
            message: message.into(),
        }
    }
}

impl EdgeListSource for EdgeListFile {
    fn read(&self) -> Result<Vec<EdgeAddress>> {
        let file = File::open(&self.path).map_err(|e| self.list_error(e.to_string()))?;

        let entries: Vec<String> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| self.list_error(e.to_string()))?;

        let mut edges = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.trim();
            if entry.is_empty() {
                tracing::warn!(path = %self.path.display(), "Skipping blank edge address");
                continue;
            }
            edges.push(EdgeAddress::new(entry));
        }

        tracing::debug!(
            path = %self.path.display(),
            edges = edges.len(),
            "Edge list loaded"
        );

        Ok(edges)
    }
}

/// Fixed edge list, handy for embedding and tests
impl EdgeListSource for Vec<EdgeAddress> {
    fn read(&self) -> Result<Vec<EdgeAddress>> {
        Ok(self.clone())
    }
}
