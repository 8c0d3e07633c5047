// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for spanwright.
//!
//! Nothing in the enrichment path is fatal: resolution misses are plain `None`
//! values and formatter failures are logged and swallowed. The enums here cover
//! configuration loading, installation, and the formatter boundary.

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl ConfigError {
    /// Create an invalid-value error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Failure of a user-supplied span-name formatter.
///
/// Only ever logged; the original span name is kept.
#[derive(Error, Debug)]
pub enum FormatterError {
    #[error("formatter failed: {0}")]
    Failed(String),

    #[error("formatter panicked: {0}")]
    Panicked(String),
}

impl FormatterError {
    /// Build from a panic payload caught with `catch_unwind`.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(message)
    }
}

impl From<anyhow::Error> for FormatterError {
    fn from(err: anyhow::Error) -> Self {
        Self::Failed(err.to_string())
    }
}

/// Errors that can occur while installing instrumentation.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Client {client} supports none of the {family} operations")]
    NoOperations { client: String, family: String },

    #[error("Unknown client family: {0}")]
    UnknownFamily(String),
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ConfigError = io_err.into();
        assert!(matches!(err, ConfigError::NotFound(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ConfigError = io_err.into();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_config_error_from_json() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{nope");
        let err: ConfigError = result.unwrap_err().into();
        assert!(matches!(err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_formatter_error_from_panic_payload() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        let err = FormatterError::from_panic(payload);
        assert_eq!(err.to_string(), "formatter panicked: boom");
    }

    #[test]
    fn test_formatter_error_from_anyhow() {
        let err: FormatterError = anyhow::anyhow!("bad template").into();
        assert!(matches!(err, FormatterError::Failed(ref m) if m == "bad template"));
    }

    #[test]
    fn test_install_error_display() {
        let err = InstallError::NoOperations {
            client: "FakeClient".to_string(),
            family: "clickhouse".to_string(),
        };
        assert!(err.to_string().contains("FakeClient"));
        assert!(err.to_string().contains("clickhouse"));
    }
}
