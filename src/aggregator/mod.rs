//! Edge content aggregator
//!
//! Polls every configured edge, keeps ready items and drops anything already
//! forwarded, producing one `CycleBatch` per cycle.

mod batch;
mod dedup;
mod edge_aggregator;

pub use batch::CycleBatch;
pub use dedup::{Deduplicator, SeenSet};
pub use edge_aggregator::{Aggregator, CycleReport};
