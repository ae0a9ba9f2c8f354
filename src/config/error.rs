//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value in environment variable `{0}`: {1}")]
    Env(&'static str, String),

    #[error("Config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("site.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("site.toml"));

        let validation_err = ConfigError::Validation("jobs must be at least 1".to_string());
        assert!(format!("{validation_err}").contains("jobs must be at least 1"));

        let env_err = ConfigError::Env("BASE_URL", "empty".to_string());
        assert!(format!("{env_err}").contains("BASE_URL"));
    }
}
