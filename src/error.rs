// src/error.rs

//! Unified error handling for the ingestion pipeline.

use std::fmt;

use thiserror::Error;

use crate::models::Stage;

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed or out-of-range calendar date
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Upstream puzzle API answered with a non-success status
    #[error("Fetch failed with HTTP {status} for {url}: {body_prefix}")]
    Fetch {
        status: u16,
        url: String,
        body_prefix: String,
    },

    /// Upstream payload lacks the structure the builder needs
    #[error("Parse error: {0}")]
    Parse(String),

    /// The all-or-nothing gate refused to stage a partially built puzzle
    #[error("Batch aborted: built {built} of {expected} clues ({failures} failed)")]
    BatchAbort {
        expected: usize,
        built: usize,
        failures: usize,
    },

    /// A staging delete/insert/cleanup write failed
    #[error("Staging write failed at {stage}: {message}")]
    StagingWrite { stage: Stage, message: String },

    /// The promotion procedure reported failure
    #[error("Promotion failed: {0}")]
    Promotion(String),

    /// A data store request returned a non-success status
    #[error("Store {operation} failed with HTTP {status}: {body}")]
    Store {
        operation: String,
        status: u16,
        body: String,
    },
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

    /// Create a payload parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a staging write error for the given stage.
    pub fn staging(stage: Stage, message: impl fmt::Display) -> Self {
        Self::StagingWrite {
            stage,
            message: message.to_string(),
        }
    }

    /// Create a store error with request context.
    pub fn store(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Store {
            operation: operation.into(),
            status,
            body: body.into(),
        }
    }

    /// Structured context for the failure log, when the error carries any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Fetch {
                status,
                url,
                body_prefix,
            } => Some(serde_json::json!({
                "status": status,
                "url": url,
                "body_prefix": body_prefix,
            })),
            Self::BatchAbort {
                expected,
                built,
                failures,
            } => Some(serde_json::json!({
                "expected": expected,
                "built": built,
                "failures": failures,
            })),
            Self::Store {
                operation,
                status,
                body,
            } => Some(serde_json::json!({
                "operation": operation,
                "status": status,
                "body": body,
            })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message_carries_context() {
        let err = AppError::Fetch {
            status: 404,
            url: "https://puzzles.example/2024-03-01.json".to_string(),
            body_prefix: "not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("2024-03-01.json"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_details_for_fetch_error() {
        let err = AppError::Fetch {
            status: 503,
            url: "https://puzzles.example/2024-03-01.json".to_string(),
            body_prefix: "busy".to_string(),
        };
        let details = err.details().unwrap();
        assert_eq!(details["status"], 503);
        assert_eq!(details["url"], "https://puzzles.example/2024-03-01.json");
        assert!(AppError::parse("no clues").details().is_none());
    }

    #[test]
    fn test_staging_helper() {
        let err = AppError::staging(Stage::InsertStaging, "boom");
        assert_eq!(err.to_string(), "Staging write failed at insert_staging: boom");
    }
}
