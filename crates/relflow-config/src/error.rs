//! Configuration error types.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    NotFound(std::path::PathBuf),

    /// Invalid TOML syntax.
    #[error("invalid TOML: {0}")]
    InvalidToml(#[from] toml::de::Error),

    /// Failed to render TOML.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_not_found_display() {
        let err = ConfigError::NotFound(PathBuf::from("/path/to/relflow.toml"));
        assert_eq!(
            err.to_string(),
            "configuration file not found: /path/to/relflow.toml"
        );
    }

    #[test]
    fn test_invalid_display() {
        let err = ConfigError::Invalid("target.key must not be empty".to_string());
        assert_eq!(
            err.to_string(),
            "invalid configuration: target.key must not be empty"
        );
    }

    #[test]
    fn test_error_is_debug() {
        let err = ConfigError::Invalid("test".to_string());
        let debug = format!("{err:?}");
        assert!(debug.contains("Invalid"));
    }
}
