//! Edge Vertex - aggregates ready contents from edge nodes into DDM
//!
//! A periodic daemon: every cycle it reads the edge list, asks each edge for
//! its open buckets, keeps the ready contents it has never forwarded before
//! and publishes them to DDM in one batch.
//!
//! # Architecture
//!
//! - **edge**: Edge list provider and edge HTTP client
//! - **aggregator**: Per-cycle selection and the seen-identifier set
//! - **ddm**: DDM publisher client
//! - **daemon**: Cycle scheduler, running totals, metrics
//! - **config**: Daemon configuration and validation
//! - **server**: Optional `/metrics` endpoint

pub mod aggregator;
pub mod config;
pub mod daemon;
pub mod ddm;
pub mod edge;
pub mod error;
pub mod logging;
pub mod server;

// Re-exports
pub use error::{EdgeVertexError, Result};
