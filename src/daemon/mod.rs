//! Edge daemon
//!
//! Long-running loop that aggregates edge contents and publishes them to DDM.
//!
//! # Cycle
//!
//! 1. **Read**: load the edge list fresh from disk
//! 2. **Poll**: query each edge in list order, skipping any that fail
//! 3. **Select**: keep ready items whose piece CID was never selected before
//! 4. **Publish**: submit the batch to DDM in one request
//! 5. **Idle**: wait the configured interval, measured from the end of the cycle
//!
//! # Example
//!
//! ```ignore
//! use edge_vertex::config::DaemonConfig;
//! use edge_vertex::daemon::EdgeDaemon;
//!
//! #[tokio::main]
//! async fn main() -> edge_vertex::Result<()> {
//!     let config = DaemonConfig::new()
//!         .with_ddm_token("token")
//!         .with_edge_file("edges.json")
//!         .with_interval(60);
//!
//!     let mut daemon = EdgeDaemon::bootstrap(&config).await?;
//!     daemon.run().await
//! }
//! ```

pub mod metrics;
mod scheduler;

pub use scheduler::{
    CycleStatus, CycleSummary, DaemonCommand, DaemonEvent, DaemonTotals, EdgeDaemon,
    DEFAULT_EVENT_CHANNEL_CAPACITY,
};
