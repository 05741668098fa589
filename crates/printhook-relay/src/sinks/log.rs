//! Dry-run sink
//!
//! Logs each prepared message instead of printing it. Useful for checking a
//! capture URL and the truncation policy without a printer attached.

use async_trait::async_trait;
use tracing::info;

use super::{PrintSink, RenderOptions};
use crate::error::SinkError;

/// Sink that only logs what would have been printed
pub struct LogPrintSink;

impl LogPrintSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogPrintSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrintSink for LogPrintSink {
    async fn render_and_print(
        &self,
        text: &str,
        options: &RenderOptions,
    ) -> Result<(), SinkError> {
        info!(
            "Dry run, not printing ({} chars, options: [{}]):\n{}",
            text.chars().count(),
            options.to_args().join(" "),
            text
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
