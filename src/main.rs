//! Edge Vertex - aggregates available contents from edges into DDM
//!
//! Main entry point for the edge-vertex CLI.

use clap::{Args, Parser, Subcommand};
use edge_vertex::config::{validate_config_result, DaemonConfig};
use edge_vertex::daemon::EdgeDaemon;
use edge_vertex::server::MetricsServer;
use edge_vertex::EdgeVertexError;
use std::path::PathBuf;
use std::process;

/// An application that aggregates available contents from edges
#[derive(Parser, Debug)]
#[command(name = "edge-vertex")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a YAML config file; flags and env vars override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the daemon to continuously publish edge contents to DDM
    #[command(visible_alias = "d")]
    Daemon(DaemonArgs),
}

#[derive(Args, Debug)]
struct DaemonArgs {
    /// Address of the DDM instance [default: http://127.0.0.1:1415]
    #[arg(long, env = "DDM_URL")]
    ddm_api: Option<String>,

    /// DDM auth token
    #[arg(long, env = "DDM_TOKEN", hide_env_values = true)]
    ddm_token: Option<String>,

    /// File containing edge addresses [default: edges.json]
    #[arg(long, env = "EDGE_FILE")]
    edge_file: Option<PathBuf>,

    /// Interval in seconds between each run [default: 300]
    #[arg(long, env = "INTERVAL")]
    interval: Option<u64>,

    /// Timeout in seconds for each edge and DDM request [default: 30]
    #[arg(long, env = "REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// Address to serve /metrics on (disabled when unset)
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,

    /// Skip the DDM health check at startup
    #[arg(long)]
    skip_health_check: bool,
}

impl DaemonArgs {
    /// Layer CLI/env values over a base config
    fn apply(self, mut config: DaemonConfig) -> DaemonConfig {
        if let Some(api) = self.ddm_api {
            config.ddm_api = api;
        }
        if let Some(token) = self.ddm_token {
            config.ddm_token = Some(token);
        }
        if let Some(path) = self.edge_file {
            config.edge_file = path;
        }
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(timeout) = self.request_timeout {
            config.request_timeout = timeout;
        }
        if let Some(addr) = self.metrics_addr {
            config.metrics_addr = Some(addr);
        }
        if self.skip_health_check {
            config.health_check = false;
        }
        config
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = edge_vertex::logging::init(edge_vertex::logging::DEFAULT_LEVEL) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(exit_code(&e));
    }
}

/// Exit status for an error that ended the process
///
/// 2 for configuration and startup failures, 1 for anything else.
fn exit_code(err: &EdgeVertexError) -> i32 {
    if err.is_fatal() {
        2
    } else {
        1
    }
}

async fn run(cli: Cli) -> edge_vertex::Result<()> {
    let base = match &cli.config {
        Some(path) => DaemonConfig::load(path)?,
        None => DaemonConfig::new(),
    };

    match cli.command {
        Commands::Daemon(args) => {
            let config = args.apply(base);
            validate_config_result(&config)?;

            println!("Edge Vertex");
            println!("--");
            println!(
                "DDM: {}  edges: {}  interval: {}s",
                config.ddm_api,
                config.edge_file.display(),
                config.interval
            );

            let mut daemon = EdgeDaemon::bootstrap(&config).await?;

            if let Some(addr) = &config.metrics_addr {
                let server = MetricsServer::bind(addr).await?;
                tokio::spawn(async move {
                    if let Err(e) = server.run().await {
                        tracing::error!(error = %e, "Metrics server stopped");
                    }
                });
            }

            daemon.run().await
        }
    }
}
