//! Edge daemon implementation
//!
//! Runs aggregate + publish cycles forever. The wait between cycles is
//! measured from the end of the previous cycle, so a slow cycle pushes the
//! next one out. Cycles never overlap and are never cancelled midway.

use super::metrics;
use crate::aggregator::{Aggregator, CycleBatch};
use crate::config::DaemonConfig;
use crate::ddm::{ContentPublisher, DdmClient};
use crate::edge::{EdgeClient, EdgeListFile};
use crate::Result;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};

/// Default event channel capacity
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleStatus {
    /// Edges were polled and the batch was handed to DDM
    Completed,

    /// The edge list could not be read; nothing was selected
    EdgeListFailed(String),

    /// DDM did not accept the request; the batch is lost
    PublishFailed(String),
}

impl CycleStatus {
    /// Metric label for this status
    pub fn label(&self) -> &'static str {
        match self {
            CycleStatus::Completed => "completed",
            CycleStatus::EdgeListFailed(_) => "edge_list_failed",
            CycleStatus::PublishFailed(_) => "publish_failed",
        }
    }
}

/// What happened in one cycle
#[derive(Debug, Clone)]
pub struct CycleSummary {
    /// 1-based cycle number
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub edges_polled: usize,
    pub edges_failed: usize,
    /// Items selected (and therefore marked seen) this cycle
    pub selected: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub status: CycleStatus,
}

/// Running totals since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaemonTotals {
    pub cycles: u64,
    pub success: u64,
    pub fail: u64,
}

/// Events emitted by the daemon
#[derive(Debug, Clone)]
pub enum DaemonEvent {
    /// Loop entered
    Started,

    /// A cycle began
    CycleStarted { cycle: u64 },

    /// A cycle finished (successfully or not)
    CycleCompleted(CycleSummary),

    /// Loop exited
    Stopped,
}

/// Commands accepted while the daemon is idle between cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonCommand {
    /// Skip the rest of the wait and start the next cycle
    RunNow,

    /// Leave the loop
    Shutdown,
}

enum IdleOutcome {
    Continue,
    Stop,
}

/// The edge aggregation daemon
pub struct EdgeDaemon {
    aggregator: Aggregator,
    publisher: Box<dyn ContentPublisher>,
    interval: Duration,
    totals: DaemonTotals,
    event_tx: broadcast::Sender<DaemonEvent>,
    command_tx: mpsc::Sender<DaemonCommand>,
    command_rx: Option<mpsc::Receiver<DaemonCommand>>,
}

impl EdgeDaemon {
    /// Create a daemon from its collaborators
    pub fn new(
        aggregator: Aggregator,
        publisher: impl ContentPublisher + 'static,
        interval: Duration,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel(10);

        Self {
            aggregator,
            publisher: Box::new(publisher),
            interval,
            totals: DaemonTotals::default(),
            event_tx,
            command_tx,
            command_rx: Some(command_rx),
        }
    }

    /// Build the production daemon: edge list file, HTTP edge client, DDM client
    ///
    /// Fails with a configuration error if the edge list file is missing or the
    /// token is absent, and with a health check error if DDM is unhealthy and
    /// the startup probe is enabled.
    pub async fn bootstrap(config: &DaemonConfig) -> Result<Self> {
        let timeout = config.request_timeout_duration();
        let edge_list = EdgeListFile::open(&config.edge_file)?;
        let edge_client = EdgeClient::new(timeout)?;
        let ddm = DdmClient::new(&config.ddm_api, config.token()?, timeout)?;

        if config.health_check {
            ddm.health_check().await?;
            tracing::info!(ddm = %ddm.base_url(), "Connected to DDM");
        }

        Ok(Self::new(
            Aggregator::new(edge_list, edge_client),
            ddm,
            config.interval_duration(),
        ))
    }

    /// Get an event subscriber
    pub fn subscribe(&self) -> broadcast::Receiver<DaemonEvent> {
        self.event_tx.subscribe()
    }

    /// Get a command sender
    pub fn command_sender(&self) -> mpsc::Sender<DaemonCommand> {
        self.command_tx.clone()
    }

    pub fn totals(&self) -> DaemonTotals {
        self.totals
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    fn send_event(&self, event: DaemonEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("Event sent but no receivers subscribed");
        }
    }

    /// Run one aggregate + publish cycle
    ///
    /// Never fails: an unreadable edge list yields an empty batch, and a failed
    /// publish adds nothing to the totals. Items selected this cycle stay
    /// marked seen either way.
    pub async fn run_once(&mut self) -> CycleSummary {
        let started_at = Utc::now();
        let start = Instant::now();
        let cycle = self.totals.cycles + 1;
        self.send_event(DaemonEvent::CycleStarted { cycle });

        let mut status = CycleStatus::Completed;
        let mut edges_polled = 0;
        let mut edges_failed = 0;

        let batch = match self.aggregator.run_cycle().await {
            Ok(report) => {
                edges_polled = report.edges_polled;
                edges_failed = report.failed_edges.len();
                for edge in &report.failed_edges {
                    metrics::record_edge_error(edge.as_str());
                }
                report.batch
            }
            Err(e) => {
                tracing::error!(error = %e, "Error aggregating content");
                status = CycleStatus::EdgeListFailed(e.to_string());
                CycleBatch::new()
            }
        };
        let selected = batch.len();
        metrics::record_selected(selected);
        metrics::set_seen_ids(self.aggregator.seen_count());

        let (accepted, rejected) = match self.publisher.publish(&batch).await {
            Ok(outcome) => (outcome.accepted_count(), outcome.rejected_count()),
            Err(e) => {
                tracing::error!(error = %e, items = selected, "Error publishing content to DDM");
                if status == CycleStatus::Completed {
                    status = CycleStatus::PublishFailed(e.to_string());
                }
                (0, 0)
            }
        };
        metrics::record_published(accepted, rejected);

        tracing::info!(
            cycle,
            published = selected,
            succeeded = accepted,
            failed = rejected,
            "Published {} contents to DDM, {} succeeded, {} failed",
            selected,
            accepted,
            rejected
        );

        self.totals.cycles = cycle;
        self.totals.success += accepted as u64;
        self.totals.fail += rejected as u64;

        tracing::info!(
            total_success = self.totals.success,
            total_fail = self.totals.fail,
            "Total count success: {}, fail: {}",
            self.totals.success,
            self.totals.fail
        );

        let duration = start.elapsed();
        metrics::record_cycle(status.label(), duration.as_secs_f64());

        let summary = CycleSummary {
            cycle,
            started_at,
            duration,
            edges_polled,
            edges_failed,
            selected,
            accepted,
            rejected,
            status,
        };
        self.send_event(DaemonEvent::CycleCompleted(summary.clone()));
        summary
    }

    /// Run the daemon loop until a shutdown command or SIGTERM/SIGINT
    ///
    /// The first cycle starts immediately. Shutdown requests are only
    /// observed while idle between cycles.
    pub async fn run(&mut self) -> Result<()> {
        let mut command_rx = self
            .command_rx
            .take()
            .ok_or_else(|| crate::EdgeVertexError::Other("Daemon already running".to_string()))?;
        let mut signals = ShutdownSignals::install()?;

        metrics::set_health_status(true);
        self.send_event(DaemonEvent::Started);
        tracing::info!(interval_secs = self.interval.as_secs(), "Edge daemon started");

        loop {
            self.run_once().await;

            match self.idle(&mut command_rx, &mut signals).await {
                IdleOutcome::Continue => {}
                IdleOutcome::Stop => break,
            }
        }

        metrics::set_health_status(false);
        tracing::info!(
            cycles = self.totals.cycles,
            total_success = self.totals.success,
            total_fail = self.totals.fail,
            "Edge daemon stopped"
        );
        self.send_event(DaemonEvent::Stopped);
        Ok(())
    }

    /// Wait out the interval, unless a command or signal arrives first
    async fn idle(
        &self,
        command_rx: &mut mpsc::Receiver<DaemonCommand>,
        signals: &mut ShutdownSignals,
    ) -> IdleOutcome {
        tokio::select! {
            _ = tokio::time::sleep(self.interval) => IdleOutcome::Continue,
            Some(cmd) = command_rx.recv() => match cmd {
                DaemonCommand::RunNow => IdleOutcome::Continue,
                DaemonCommand::Shutdown => {
                    tracing::info!("Received shutdown command");
                    IdleOutcome::Stop
                }
            },
            name = signals.recv() => {
                tracing::info!(signal = name, "Received signal, shutting down");
                IdleOutcome::Stop
            }
        }
    }
}

/// Process termination signals
struct ShutdownSignals {
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    #[cfg(unix)]
    fn install() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let sigterm = signal(SignalKind::terminate()).map_err(|e| {
            crate::EdgeVertexError::Other(format!("Failed to set up SIGTERM handler: {}", e))
        })?;
        let sigint = signal(SignalKind::interrupt()).map_err(|e| {
            crate::EdgeVertexError::Other(format!("Failed to set up SIGINT handler: {}", e))
        })?;
        Ok(Self { sigterm, sigint })
    }

    #[cfg(not(unix))]
    fn install() -> Result<Self> {
        Ok(Self {})
    }

    #[cfg(unix)]
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "ctrl-c"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddm::PublishOutcome;
    use crate::edge::{ContentItem, ContentStatus, EdgeAddress, EdgeListSource, EdgeQuerySource};
    use crate::EdgeVertexError;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Every edge reports the same fixed items
    struct StaticEdges(Vec<ContentItem>);

    #[async_trait]
    impl EdgeQuerySource for StaticEdges {
        async fn fetch(&self, _address: &EdgeAddress) -> Result<Vec<ContentItem>> {
            Ok(self.0.clone())
        }
    }

    /// Edge list whose readability can be toggled
    #[derive(Clone, Default)]
    struct ToggleList {
        broken: Arc<Mutex<bool>>,
    }

    impl EdgeListSource for ToggleList {
        fn read(&self) -> Result<Vec<EdgeAddress>> {
            if *self.broken.lock().unwrap() {
                return Err(EdgeVertexError::EdgeList {
                    path: "edges.json".into(),
                    message: "unexpected end of file".into(),
                });
            }
            Ok(vec![EdgeAddress::new("http://e1")])
        }
    }

    /// Publisher double: records batches, optionally fails, rejects ids starting with "bad"
    #[derive(Clone, Default)]
    struct RecordingPublisher {
        batches: Arc<Mutex<Vec<Vec<String>>>>,
        failing: Arc<Mutex<bool>>,
    }

    #[async_trait]
    impl ContentPublisher for RecordingPublisher {
        async fn publish(&self, batch: &CycleBatch) -> Result<PublishOutcome> {
            let ids: Vec<String> = batch.ids().into_iter().map(String::from).collect();
            self.batches.lock().unwrap().push(ids.clone());
            if *self.failing.lock().unwrap() {
                return Err(EdgeVertexError::Publish("error in ddm call 500".into()));
            }
            let (rejected, accepted) = ids.into_iter().partition(|id| id.starts_with("bad"));
            Ok(PublishOutcome { accepted, rejected })
        }
    }

    fn ready(cid: &str) -> ContentItem {
        ContentItem::new(cid, ContentStatus::Ready)
    }

    fn daemon(
        list: ToggleList,
        items: Vec<ContentItem>,
        publisher: RecordingPublisher,
    ) -> EdgeDaemon {
        EdgeDaemon::new(
            Aggregator::new(list, StaticEdges(items)),
            publisher,
            Duration::from_millis(10),
        )
    }

    #[tokio::test]
    async fn test_totals_accumulate() {
        let publisher = RecordingPublisher::default();
        let mut daemon = daemon(
            ToggleList::default(),
            vec![ready("A"), ready("bad-B"), ready("C")],
            publisher.clone(),
        );

        let summary = daemon.run_once().await;
        assert_eq!(summary.cycle, 1);
        assert_eq!(summary.selected, 3);
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.status, CycleStatus::Completed);

        let summary = daemon.run_once().await;
        assert_eq!(summary.selected, 0);

        assert_eq!(
            daemon.totals(),
            DaemonTotals {
                cycles: 2,
                success: 2,
                fail: 1
            }
        );
    }

    #[tokio::test]
    async fn test_publish_failure_adds_nothing_and_items_stay_seen() {
        let publisher = RecordingPublisher::default();
        *publisher.failing.lock().unwrap() = true;
        let mut daemon = daemon(ToggleList::default(), vec![ready("A")], publisher.clone());

        let summary = daemon.run_once().await;
        assert!(matches!(summary.status, CycleStatus::PublishFailed(_)));
        assert_eq!((summary.accepted, summary.rejected), (0, 0));
        assert_eq!(daemon.totals().success, 0);
        assert_eq!(daemon.totals().fail, 0);

        // DDM recovers, but A was already marked seen and is never retried
        *publisher.failing.lock().unwrap() = false;
        let summary = daemon.run_once().await;
        assert_eq!(summary.selected, 0);
        assert_eq!(summary.status, CycleStatus::Completed);
        assert!(daemon.aggregator().has_seen("A"));

        let batches = publisher.batches.lock().unwrap().clone();
        assert_eq!(batches, vec![vec!["A".to_string()], Vec::<String>::new()]);
    }

    #[tokio::test]
    async fn test_edge_list_failure_yields_empty_cycle() {
        let list = ToggleList::default();
        *list.broken.lock().unwrap() = true;
        let publisher = RecordingPublisher::default();
        let mut daemon = daemon(list.clone(), vec![ready("A")], publisher.clone());

        let summary = daemon.run_once().await;
        assert!(matches!(summary.status, CycleStatus::EdgeListFailed(_)));
        assert_eq!(summary.selected, 0);
        assert_eq!(summary.edges_polled, 0);

        // Fixed on disk: the next cycle picks it up
        *list.broken.lock().unwrap() = false;
        let summary = daemon.run_once().await;
        assert_eq!(summary.selected, 1);
        assert_eq!(summary.edges_polled, 1);
    }

    #[tokio::test]
    async fn test_run_loops_until_shutdown() {
        let publisher = RecordingPublisher::default();
        let mut daemon = daemon(ToggleList::default(), vec![ready("A")], publisher.clone());
        let mut events = daemon.subscribe();
        let commands = daemon.command_sender();

        let handle = tokio::spawn(async move {
            daemon.run().await.unwrap();
            daemon
        });

        let mut completed = 0;
        while completed < 3 {
            if let DaemonEvent::CycleCompleted(_) = events.recv().await.unwrap() {
                completed += 1;
            }
        }
        commands.send(DaemonCommand::Shutdown).await.unwrap();

        let daemon = handle.await.unwrap();
        assert!(daemon.totals().cycles >= 3);
        assert_eq!(daemon.totals().success, 1);
    }

    /// Publisher that takes a fixed time to answer
    struct SlowPublisher(Duration);

    #[async_trait]
    impl ContentPublisher for SlowPublisher {
        async fn publish(&self, _batch: &CycleBatch) -> Result<PublishOutcome> {
            tokio::time::sleep(self.0).await;
            Ok(PublishOutcome::default())
        }
    }

    #[tokio::test]
    async fn test_interval_counts_from_end_of_cycle() {
        let publish_time = Duration::from_millis(400);
        let interval = Duration::from_millis(300);
        let mut daemon = EdgeDaemon::new(
            Aggregator::new(ToggleList::default(), StaticEdges(vec![ready("A")])),
            SlowPublisher(publish_time),
            interval,
        );
        let mut events = daemon.subscribe();
        let commands = daemon.command_sender();

        let handle = tokio::spawn(async move {
            daemon.run().await.unwrap();
        });

        let mut starts = Vec::new();
        while starts.len() < 2 {
            if let DaemonEvent::CycleCompleted(summary) = events.recv().await.unwrap() {
                assert!(summary.duration >= publish_time);
                starts.push(summary.started_at);
            }
        }
        commands.send(DaemonCommand::Shutdown).await.unwrap();
        handle.await.unwrap();

        // A slow cycle pushes the next one out by its own duration
        let gap = (starts[1] - starts[0]).to_std().unwrap();
        assert!(gap >= publish_time + interval, "gap was {:?}", gap);
    }

    #[tokio::test]
    async fn test_run_twice_is_rejected() {
        let mut daemon = daemon(
            ToggleList::default(),
            Vec::new(),
            RecordingPublisher::default(),
        );
        let commands = daemon.command_sender();
        commands.send(DaemonCommand::Shutdown).await.unwrap();
        daemon.run().await.unwrap();

        assert!(daemon.run().await.is_err());
    }

    #[tokio::test]
    async fn test_bootstrap_requires_edge_file_and_token() {
        let config = DaemonConfig::new()
            .with_ddm_token("token")
            .with_edge_file("/nonexistent/edges.json")
            .with_health_check(false);
        let err = EdgeDaemon::bootstrap(&config).await.err().unwrap();
        assert!(err.is_fatal());

        let file = tempfile::NamedTempFile::new().unwrap();
        let config = DaemonConfig::new()
            .with_edge_file(file.path())
            .with_health_check(false);
        let err = EdgeDaemon::bootstrap(&config).await.err().unwrap();
        assert!(err.is_fatal());

        let config = config.with_ddm_token("token").with_interval(7);
        let daemon = EdgeDaemon::bootstrap(&config).await.unwrap();
        assert_eq!(daemon.interval(), Duration::from_secs(7));
    }
}
