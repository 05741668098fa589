//! Poll, filter, dedup and advance loop.
//!
//! One sequential worker: fetch a batch, forward every eligible event newer
//! than the watermark, then move the watermark to the newest `created_at`
//! seen in the batch. The watermark moves for ineligible events too, so a
//! malformed request is never reconsidered on the next poll.

use chrono::{DateTime, Utc};
use printhook_core::{classify, prepare_message, RawEvent, RelayConfig, WatermarkStore};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::SinkError;
use crate::sinks::{PrintSink, RenderOptions};
use crate::source::EventSource;

/// Per-process engine settings
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub check_interval: Duration,
    /// Truncation limit in characters, 0 disables truncation
    pub max_length: usize,
    pub print_timeout: Duration,
    pub render_options: RenderOptions,
}

impl EngineSettings {
    pub fn from_config(config: &RelayConfig, render_options: RenderOptions) -> Self {
        Self {
            check_interval: config.check_interval,
            max_length: config.max_length,
            print_timeout: config.print_timeout,
            render_options,
        }
    }
}

/// What happened to one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Watermark after the batch; never older than the one it started from
    pub watermark: DateTime<Utc>,
    pub advanced: bool,
    /// Messages the sink accepted
    pub forwarded: usize,
    /// Messages the sink rejected or timed out on
    pub failed: usize,
    /// Events at or below the starting watermark
    pub stale: usize,
    /// Newer events that were not printable
    pub ineligible: usize,
    /// Events without a `created_at`
    pub undated: usize,
}

impl BatchOutcome {
    fn starting_at(watermark: DateTime<Utc>) -> Self {
        Self {
            watermark,
            advanced: false,
            forwarded: 0,
            failed: 0,
            stale: 0,
            ineligible: 0,
            undated: 0,
        }
    }
}

/// The relay engine
pub struct PollEngine {
    source: Arc<dyn EventSource>,
    sink: Arc<dyn PrintSink>,
    store: WatermarkStore,
    settings: EngineSettings,
}

impl PollEngine {
    pub fn new(
        source: Arc<dyn EventSource>,
        sink: Arc<dyn PrintSink>,
        store: WatermarkStore,
        settings: EngineSettings,
    ) -> Self {
        Self {
            source,
            sink,
            store,
            settings,
        }
    }

    /// Run until `shutdown` is cancelled, starting from `start`.
    ///
    /// Cancellation interrupts the sleep between polls; a batch in progress
    /// is always finished first. Returns the last watermark held.
    pub async fn run(&self, start: DateTime<Utc>, shutdown: CancellationToken) -> DateTime<Utc> {
        info!(
            "Polling {} every {:?}, printing through {} sink",
            self.source.describe(),
            self.settings.check_interval,
            self.sink.name()
        );

        let mut watermark = start;
        while !shutdown.is_cancelled() {
            watermark = self.poll_once(watermark).await;

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.settings.check_interval) => {}
            }
        }

        info!("Relay stopped at watermark {}", watermark.to_rfc3339());
        watermark
    }

    /// One fetch, process and persist iteration.
    ///
    /// Fetch errors leave the watermark untouched. The watermark is persisted
    /// only when the batch moved it.
    pub async fn poll_once(&self, watermark: DateTime<Utc>) -> DateTime<Utc> {
        let events = match self.source.fetch_batch().await {
            Ok(events) => events,
            Err(e) => {
                error!("Failed to fetch requests from {}: {}", self.source.describe(), e);
                return watermark;
            }
        };

        if events.is_empty() {
            debug!("No requests found");
            return watermark;
        }

        let outcome = self.process_batch(&events, watermark).await;
        debug!(
            "Batch of {} processed: {} forwarded, {} failed, {} stale, {} ineligible, {} undated",
            events.len(),
            outcome.forwarded,
            outcome.failed,
            outcome.stale,
            outcome.ineligible,
            outcome.undated
        );

        if outcome.advanced {
            match self.store.save(outcome.watermark) {
                Ok(()) => debug!("Updated watermark to {}", outcome.watermark.to_rfc3339()),
                Err(e) => error!(
                    "Failed to persist watermark {}: {}",
                    outcome.watermark.to_rfc3339(),
                    e
                ),
            }
        }

        outcome.watermark
    }

    /// Forward every eligible event newer than `watermark`, in batch order.
    ///
    /// Sink failures are logged per event and never stop the batch. The
    /// returned watermark is the newest `created_at` above `watermark`, or
    /// `watermark` itself when nothing newer was seen.
    pub async fn process_batch(
        &self,
        events: &[RawEvent],
        watermark: DateTime<Utc>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::starting_at(watermark);
        let mut most_recent = watermark;

        for event in events {
            let Some(classified) = classify(event) else {
                debug!("Skipping request {} without created_at", event.label());
                outcome.undated += 1;
                continue;
            };

            if classified.created_at <= watermark {
                debug!(
                    "Skipping request {} from {} (last processed {})",
                    event.label(),
                    classified.created_at.to_rfc3339(),
                    watermark.to_rfc3339()
                );
                outcome.stale += 1;
                continue;
            }

            most_recent = most_recent.max(classified.created_at);

            if !classified.is_eligible {
                debug!(
                    "Skipping request {}: not a POST with a JSON message",
                    event.label()
                );
                outcome.ineligible += 1;
                continue;
            }

            let payload = match classified.payload {
                Some(payload) if !payload.is_empty() => payload,
                _ => {
                    debug!("Skipping request {}: empty message", event.label());
                    outcome.ineligible += 1;
                    continue;
                }
            };

            info!(
                "[{}] New message ({} chars): {}",
                classified.created_at.to_rfc3339(),
                payload.chars().count(),
                payload
            );

            match self.forward(&payload).await {
                Ok(()) => {
                    info!("Message {} printed successfully", event.label());
                    outcome.forwarded += 1;
                }
                Err(e) => {
                    error!("Failed to print message {}: {}", event.label(), e);
                    outcome.failed += 1;
                }
            }
        }

        if most_recent > watermark {
            outcome.watermark = most_recent;
            outcome.advanced = true;
        }
        outcome
    }

    async fn forward(&self, payload: &str) -> Result<(), SinkError> {
        let prepared = prepare_message(payload, self.settings.max_length);
        if prepared.len() != payload.len() {
            info!(
                "Message truncated from {} to {} characters",
                payload.chars().count(),
                prepared.chars().count()
            );
        }

        let timeout = self.settings.print_timeout;
        let call = self
            .sink
            .render_and_print(&prepared, &self.settings.render_options);
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Print sink {} did not finish within {:?}", self.sink.name(), timeout);
                Err(SinkError::Timeout(timeout))
            }
        }
    }
}
