//! Error types shared by the printhook crates

use std::path::PathBuf;
use thiserror::Error;

/// Failures writing or removing the watermark record
#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error("Watermark IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid relay configuration, reported before the poll loop starts
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid webhook URL: {0}")]
    InvalidWebhookUrl(String),

    #[error("Webhook URL has no token: {0}")]
    MissingToken(String),

    #[error("Invalid API base URL: {0}")]
    InvalidApiBase(String),

    #[error("Invalid start time: {0}")]
    InvalidStartTime(String),

    #[error("Configuration error: {message}")]
    Invalid { message: String },
}
