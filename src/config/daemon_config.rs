//! Daemon configuration
//!
//! Built from defaults, an optional YAML file and CLI/environment overrides,
//! in that order of precedence.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default DDM base address
pub const DEFAULT_DDM_API: &str = "http://127.0.0.1:1415";

/// Default edge list file
pub const DEFAULT_EDGE_FILE: &str = "edges.json";

/// Default interval between cycles (5 minutes)
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Default timeout applied to every outbound request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

fn default_ddm_api() -> String {
    DEFAULT_DDM_API.to_string()
}

fn default_edge_file() -> PathBuf {
    PathBuf::from(DEFAULT_EDGE_FILE)
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_health_check() -> bool {
    true
}

/// Edge Vertex daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaemonConfig {
    /// Base address of the DDM instance
    #[serde(default = "default_ddm_api")]
    pub ddm_api: String,

    /// Bearer token for DDM (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddm_token: Option<String>,

    /// JSON file holding the edge addresses, re-read every cycle
    #[serde(default = "default_edge_file")]
    pub edge_file: PathBuf,

    /// Seconds to wait after a cycle finishes before starting the next
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Per-request timeout in seconds for edge and DDM calls
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Probe DDM once at startup and refuse to start if it is unhealthy
    #[serde(default = "default_health_check")]
    pub health_check: bool,

    /// Address for the /metrics endpoint (disabled when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_addr: Option<String>,
}

impl DaemonConfig {
    /// Create a config with default values and no token
    pub fn new() -> Self {
        Self {
            ddm_api: default_ddm_api(),
            ddm_token: None,
            edge_file: default_edge_file(),
            interval: default_interval(),
            request_timeout: default_request_timeout(),
            health_check: default_health_check(),
            metrics_addr: None,
        }
    }

    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::EdgeVertexError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading daemon configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            ddm_api = %config.ddm_api,
            edge_file = %config.edge_file.display(),
            interval = config.interval,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Set the DDM base address
    pub fn with_ddm_api(mut self, api: impl Into<String>) -> Self {
        self.ddm_api = api.into();
        self
    }

    /// Set the DDM token
    pub fn with_ddm_token(mut self, token: impl Into<String>) -> Self {
        self.ddm_token = Some(token.into());
        self
    }

    /// Set the edge list file
    pub fn with_edge_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.edge_file = path.into();
        self
    }

    /// Set the interval in seconds
    pub fn with_interval(mut self, secs: u64) -> Self {
        self.interval = secs;
        self
    }

    /// Set the per-request timeout in seconds
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout = secs;
        self
    }

    /// Enable or disable the startup health check
    pub fn with_health_check(mut self, enabled: bool) -> Self {
        self.health_check = enabled;
        self
    }

    /// Set the metrics listen address
    pub fn with_metrics_addr(mut self, addr: impl Into<String>) -> Self {
        self.metrics_addr = Some(addr.into());
        self
    }

    /// Interval between cycles
    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// Timeout for outbound requests
    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// The DDM token, or a configuration error when absent
    pub fn token(&self) -> Result<&str> {
        match self.ddm_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(crate::EdgeVertexError::Config(
                "DDM auth token is required (--ddm-token or DDM_TOKEN)".to_string(),
            )),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::new()
    }
}
