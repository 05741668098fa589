//! Core types shared by the printhook crates
//!
//! Everything here is free of network and process I/O: timestamp
//! normalization, the watermark record, event classification, message
//! preparation and relay configuration.

pub mod config;
pub mod error;
pub mod events;
pub mod message;
pub mod timestamps;
pub mod watermark;

pub use config::*;
pub use error::*;
pub use events::{classify, extract_payload, is_eligible, ClassifiedEvent, RawEvent};
pub use message::{prepare_message, DEFAULT_MAX_LENGTH, ELLIPSIS};
pub use timestamps::{parse_timestamp, sentinel_timestamp, try_parse_timestamp};
pub use watermark::{format_watermark, resolve_start, StartingPoint, WatermarkStore};

// Re-export external dependencies
pub use chrono;
pub use serde_json;
