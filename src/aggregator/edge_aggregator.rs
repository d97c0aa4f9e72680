//! Edge aggregator implementation

use super::batch::CycleBatch;
use super::dedup::{Deduplicator, SeenSet};
use crate::edge::{EdgeAddress, EdgeListSource, EdgeQuerySource};
use crate::Result;

/// Outcome of one aggregation cycle
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Novel ready items selected this cycle
    pub batch: CycleBatch,

    /// Number of edges in the list this cycle
    pub edges_polled: usize,

    /// Edges whose fetch failed (contributed nothing)
    pub failed_edges: Vec<EdgeAddress>,

    /// Items reported across all reachable edges
    pub items_reported: usize,

    /// Items skipped because they were not ready
    pub not_ready: usize,

    /// Ready items already selected in an earlier cycle
    pub already_seen: usize,

    /// Ready items reported by more than one edge this cycle
    pub duplicates_in_cycle: usize,
}

impl CycleReport {
    fn new(edges_polled: usize) -> Self {
        Self {
            edges_polled,
            ..Default::default()
        }
    }
}

/// Polls every edge and keeps the ready items nobody has forwarded yet
///
/// Owns the seen set. An item is marked seen the moment it is selected,
/// so it is never selected again even if publishing it later fails.
pub struct Aggregator {
    edge_list: Box<dyn EdgeListSource>,
    edge_api: Box<dyn EdgeQuerySource>,
    seen: Box<dyn Deduplicator>,
}

impl Aggregator {
    /// Create an aggregator with an empty in-memory seen set
    pub fn new(
        edge_list: impl EdgeListSource + 'static,
        edge_api: impl EdgeQuerySource + 'static,
    ) -> Self {
        Self::with_deduplicator(edge_list, edge_api, SeenSet::new())
    }

    /// Create an aggregator with a custom deduplicator
    pub fn with_deduplicator(
        edge_list: impl EdgeListSource + 'static,
        edge_api: impl EdgeQuerySource + 'static,
        seen: impl Deduplicator + 'static,
    ) -> Self {
        Self {
            edge_list: Box::new(edge_list),
            edge_api: Box::new(edge_api),
            seen: Box::new(seen),
        }
    }

    /// Number of identifiers selected since startup
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Whether an identifier has ever been selected
    pub fn has_seen(&self, piece_cid: &str) -> bool {
        self.seen.contains(piece_cid)
    }

    /// Run one aggregation cycle
    ///
    /// Fails only when the edge list cannot be read. A failing edge is logged
    /// and skipped; the remaining edges are still polled.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let edges = self.edge_list.read()?;
        let mut report = CycleReport::new(edges.len());

        for address in &edges {
            let items = match self.edge_api.fetch(address).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(edge = %address, error = %e, "Failed to get open buckets");
                    report.failed_edges.push(address.clone());
                    continue;
                }
            };

            tracing::debug!(edge = %address, items = items.len(), "Fetched edge contents");
            report.items_reported += items.len();

            for item in items {
                if !item.is_ready() {
                    report.not_ready += 1;
                    continue;
                }

                if report.batch.contains(&item.piece_cid) {
                    tracing::debug!(
                        edge = %address,
                        piece_cid = %item.piece_cid,
                        "Duplicate within cycle, keeping first edge's copy"
                    );
                    report.duplicates_in_cycle += 1;
                    continue;
                }

                // Marked seen on selection, before any publish attempt
                if self.seen.insert(&item.piece_cid) {
                    report.batch.push(item);
                } else {
                    tracing::debug!(piece_cid = %item.piece_cid, "Already forwarded");
                    report.already_seen += 1;
                }
            }
        }

        tracing::debug!(
            edges = report.edges_polled,
            failed = report.failed_edges.len(),
            selected = report.batch.len(),
            seen_total = self.seen.len(),
            "Aggregation cycle complete"
        );

        Ok(report)
    }
}
