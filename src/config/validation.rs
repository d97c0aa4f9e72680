//! Configuration validation
//!
//! Checks run before the daemon loop starts:
//! - A DDM token is present
//! - The edge list file exists
//! - The DDM address is an http(s) URL
//! - Interval and timeout are non-zero

use super::daemon_config::DaemonConfig;
use crate::EdgeVertexError;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a daemon configuration
pub fn validate_config(config: &DaemonConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.token().is_err() {
        errors.push(ValidationError::new(
            "ddm_token",
            "DDM auth token is required (--ddm-token or DDM_TOKEN)",
        ));
    }

    if !config.ddm_api.starts_with("http://") && !config.ddm_api.starts_with("https://") {
        errors.push(ValidationError::new(
            "ddm_api",
            format!("Invalid DDM URL: {}", config.ddm_api),
        ));
    }

    if !config.edge_file.exists() {
        errors.push(ValidationError::new(
            "edge_file",
            format!("Edge list file {} does not exist", config.edge_file.display()),
        ));
    }

    if config.interval == 0 {
        errors.push(ValidationError::new(
            "interval",
            "Interval must be greater than 0",
        ));
    }

    if config.request_timeout == 0 {
        errors.push(ValidationError::new(
            "request_timeout",
            "Request timeout must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate and convert to a crate Result
pub fn validate_config_result(config: &DaemonConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        EdgeVertexError::Config(messages.join("; "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn valid_config(edge_file: &std::path::Path) -> DaemonConfig {
        DaemonConfig::new()
            .with_ddm_token("token")
            .with_edge_file(edge_file)
    }

    #[test]
    fn test_valid_config() {
        let file = NamedTempFile::new().unwrap();
        assert!(validate_config(&valid_config(file.path())).is_ok());
    }

    #[test]
    fn test_missing_token() {
        let file = NamedTempFile::new().unwrap();
        let config = DaemonConfig::new().with_edge_file(file.path());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "ddm_token");
    }

    #[test]
    fn test_missing_edge_file() {
        let config = DaemonConfig::new()
            .with_ddm_token("token")
            .with_edge_file("/nonexistent/edges.json");

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "edge_file"));
    }

    #[test]
    fn test_bad_url_and_zero_values() {
        let file = NamedTempFile::new().unwrap();
        let config = valid_config(file.path())
            .with_ddm_api("ddm.local:1415")
            .with_interval(0)
            .with_request_timeout(0);

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["ddm_api", "interval", "request_timeout"]);
    }

    #[test]
    fn test_result_is_fatal_config_error() {
        let err = validate_config_result(&DaemonConfig::new().with_edge_file("/nope")).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("ddm_token"));
        assert!(err.to_string().contains("edge_file"));
    }
}
