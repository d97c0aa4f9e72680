//! Logging configuration using tracing
//!
//! Structured logging to stderr with support for the RUST_LOG environment variable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for the daemon when RUST_LOG is unset
pub const DEFAULT_LEVEL: &str = "info";

/// Initialize the tracing subscriber
///
/// Filtering comes from RUST_LOG when set, otherwise `default_level`.
///
/// # Example RUST_LOG values
/// - `RUST_LOG=debug` - Show per-item dedup decisions
/// - `RUST_LOG=edge_vertex=debug,reqwest=warn` - Different levels per crate
///
/// # Errors
/// Returns an error if the subscriber has already been initialized
pub fn init(default_level: &str) -> crate::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_line_number(true))
        .try_init()
        .map_err(|e| {
            crate::EdgeVertexError::Other(format!("Failed to initialize tracing: {}", e))
        })?;

    Ok(())
}

/// Initialize logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init("debug");
}
