//! # printhook-relay
//!
//! Relays messages captured by a webhook.site URL to a receipt printer.
//!
//! This crate provides:
//! - A client for the request-log listing of a capture token
//! - Printer sinks (external command, dry-run log)
//! - The poll loop that dedups requests against a durable watermark

mod engine;
mod error;
mod sinks;
mod source;

pub use engine::{BatchOutcome, EngineSettings, PollEngine};
pub use error::{RelayError, SinkError};
pub use sinks::{Binarization, CommandPrintSink, LogPrintSink, PrintSink, RenderOptions};
pub use source::{EventSource, RequestListing, WebhookSiteClient};
