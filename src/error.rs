// src/error.rs

//! Unified error handling for the gazette pipeline.
//!
//! Only [`AppError`] crosses the run boundary. Per-source and per-entry
//! failures ([`SourceFailure`], [`NormalizationReject`]) are contained
//! inside the pipeline and end up as counters in the run report.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for gazette operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The new snapshot could not be committed
    #[error("Persistence error for {path}: {message}")]
    Persistence { path: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a persistence error for the given path.
    pub fn persistence(path: impl AsRef<Path>, message: impl fmt::Display) -> Self {
        Self::Persistence {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }
}

/// Why a single source yielded nothing this run.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SourceFailure {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for SourceFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Why a single raw entry was dropped by the normalizer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationReject {
    #[error("entry has no title")]
    MissingTitle,

    #[error("entry has no usable link")]
    MissingLink,

    #[error("entry summary exceeds the size ceiling")]
    Oversized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_error_mentions_path() {
        let err = AppError::persistence("/tmp/news_data.json", "disk full");
        let text = err.to_string();
        assert!(text.contains("/tmp/news_data.json"));
        assert!(text.contains("disk full"));
    }

    #[test]
    fn source_failure_serializes_with_kind_tag() {
        let json = serde_json::to_value(SourceFailure::Transport("HTTP 502".into())).unwrap();
        assert_eq!(json["kind"], "transport");
        assert_eq!(json["detail"], "HTTP 502");

        let json = serde_json::to_value(SourceFailure::Timeout).unwrap();
        assert_eq!(json["kind"], "timeout");
    }
}
