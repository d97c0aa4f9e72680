//! Edge nodes
//!
//! - **content**: records reported by edges (`ContentItem`, `ContentStatus`, `EdgeAddress`)
//! - **list**: where the set of edges to poll comes from (`EdgeListSource`)
//! - **client**: querying a single edge over HTTP (`EdgeQuerySource`)

mod client;
mod content;
mod list;

pub use client::{absolutize_download_url, EdgeClient, EdgeQuerySource, OPEN_BUCKETS_PATH};
pub use content::{ContentItem, ContentStatus, EdgeAddress};
pub use list::{EdgeListFile, EdgeListSource};
