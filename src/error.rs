// src/error.rs
use std::io;
use thiserror::Error;

/// Result type used throughout the exporter library
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Custom Error type for the exporter
#[derive(Error, Debug)]
pub enum ExporterError {
    /// Token exchange failed or returned a malformed body
    #[error("Auth error: {0}")]
    Auth(String),

    /// Non-2xx status or network failure on an Azure call
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Input failed validation (empty tag value, missing name or unit)
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Exposition error: {0}")]
    Exposition(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<prometheus::Error> for ExporterError {
    fn from(err: prometheus::Error) -> Self {
        ExporterError::Exposition(err.to_string())
    }
}

impl From<reqwest::Error> for ExporterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ExporterError::Decode(err.to_string())
        } else {
            ExporterError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExporterError {
    fn from(err: serde_json::Error) -> Self {
        ExporterError::Decode(err.to_string())
    }
}
