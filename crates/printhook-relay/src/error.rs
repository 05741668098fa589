//! Relay error types

use std::time::Duration;
use thiserror::Error;

/// Failures fetching or decoding a batch from the request-log API
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Failures handing one message to the printer
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to start print command {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Print command {program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Print call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Print sink error: {0}")]
    Other(String),
}
