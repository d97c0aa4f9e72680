//! Content records reported by edge nodes

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Address of an edge node (base URL)
///
/// Opaque to the daemon; duplicates in the edge list just cause redundant queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeAddress(String);

impl EdgeAddress {
    /// Create a new edge address
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The address as given in the edge list
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join a path onto the address without doubling slashes
    pub fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.0.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl fmt::Display for EdgeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EdgeAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle status of a content item on an edge
///
/// Unrecognised statuses are kept verbatim so one odd record never
/// invalidates the rest of an edge's payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentStatus {
    Processing,
    Open,
    Ready,
    Unknown(String),
}

impl ContentStatus {
    /// Only ready items are eligible for publishing
    pub fn is_ready(&self) -> bool {
        matches!(self, ContentStatus::Ready)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContentStatus::Processing => "processing",
            ContentStatus::Open => "open",
            ContentStatus::Ready => "ready",
            ContentStatus::Unknown(s) => s,
        }
    }
}

impl Default for ContentStatus {
    fn default() -> Self {
        ContentStatus::Unknown(String::new())
    }
}

impl From<String> for ContentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "processing" => ContentStatus::Processing,
            "open" => ContentStatus::Open,
            "ready" => ContentStatus::Ready,
            _ => ContentStatus::Unknown(s),
        }
    }
}

impl From<ContentStatus> for String {
    fn from(status: ContentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bucket content record from `GET /buckets/get-open`
///
/// Edges send `null` for unset fields; those read as the zero value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub bucket_uuid: String,

    /// Piece CID; the dedup key
    pub piece_cid: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub payload_cid: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub dir_cid: String,

    /// Padded piece size in bytes
    #[serde(default, deserialize_with = "null_as_default")]
    pub piece_size: u64,

    /// Download location, rewritten to an absolute URL by the edge client
    #[serde(default, deserialize_with = "null_as_default")]
    pub download_url: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ContentStatus,

    /// Unpadded size in bytes
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub collection: String,
}

/// Read a JSON `null` as the type's default value
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ContentItem {
    /// Create an item with the given piece CID and status
    pub fn new(piece_cid: impl Into<String>, status: ContentStatus) -> Self {
        Self {
            piece_cid: piece_cid.into(),
            status,
            ..Default::default()
        }
    }

    /// Set the payload CID
    pub fn with_payload_cid(mut self, cid: impl Into<String>) -> Self {
        self.payload_cid = cid.into();
        self
    }

    /// Set the sizes
    pub fn with_sizes(mut self, size: u64, piece_size: u64) -> Self {
        self.size = size;
        self.piece_size = piece_size;
        self
    }

    /// Set the collection label
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Set the download URL
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = url.into();
        self
    }

    pub fn is_ready(&self) -> bool {
        self.status.is_ready()
    }
}
