//! Configuration system
//!
//! Daemon settings come from three layers:
//! - Built-in defaults
//! - An optional YAML file (`--config`)
//! - CLI flags and environment variables (`DDM_URL`, `DDM_TOKEN`, `EDGE_FILE`, `INTERVAL`)

mod daemon_config;
pub mod validation;

pub use daemon_config::{
    DaemonConfig, DEFAULT_DDM_API, DEFAULT_EDGE_FILE, DEFAULT_INTERVAL_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use validation::{validate_config, validate_config_result, ValidationError};
