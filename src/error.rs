//! Error types for Edge Vertex
//!
//! One enum covers every failure mode of the daemon. Configuration and
//! startup errors abort the process; everything else is reported by the
//! cycle that hit it and the loop carries on.

use std::path::PathBuf;
use thiserror::Error;

/// Longest response body excerpt kept in error messages
pub(crate) const ERROR_BODY_LIMIT: usize = 256;

/// Result type alias for Edge Vertex operations
pub type Result<T> = std::result::Result<T, EdgeVertexError>;

/// Error type for Edge Vertex operations
#[derive(Error, Debug)]
pub enum EdgeVertexError {
    /// Configuration errors (missing token, missing edge file, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The edge list could not be read or parsed
    #[error("Edge list error ({}): {message}", path.display())]
    EdgeList { path: PathBuf, message: String },

    /// A single edge could not be queried
    #[error("Edge {address}: {message}")]
    Edge { address: String, message: String },

    /// DDM rejected or never received a publish request
    #[error("Publish error: {0}")]
    Publish(String),

    /// DDM health probe failed at startup
    #[error("DDM health check failed: {0}")]
    HealthCheck(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl EdgeVertexError {
    /// Build an edge error for the given address
    pub fn edge(address: impl Into<String>, message: impl Into<String>) -> Self {
        EdgeVertexError::Edge {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Whether this error must stop the process before the loop starts
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EdgeVertexError::Config(_) | EdgeVertexError::HealthCheck(_)
        )
    }
}

/// Truncate a response body for inclusion in an error message
pub(crate) fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
