//! Durable watermark: the UTC instant of the newest event already handled.
//!
//! The record is a single RFC 3339 string. Saves go through a temp file that
//! is fsynced and renamed over the record, so a concurrent reader sees either
//! the old value or the new one.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::error::WatermarkError;

/// How far back a fresh relay looks when there is no persisted watermark.
pub const FIRST_RUN_LOOKBACK_SECS: i64 = 60;

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// File-backed watermark record
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted watermark.
    ///
    /// A missing record and an unreadable or corrupt one both yield `None`;
    /// corruption is logged and otherwise treated as "no prior state".
    pub fn load(&self) -> Option<DateTime<Utc>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No watermark record at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!(
                    "Failed to read watermark record {}: {}",
                    self.path.display(),
                    e
                );
                return None;
            }
        };

        match DateTime::parse_from_rfc3339(contents.trim()) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(e) => {
                warn!(
                    "Ignoring corrupt watermark record {} ({:?}): {}",
                    self.path.display(),
                    contents.trim(),
                    e
                );
                None
            }
        }
    }

    /// Persist `watermark`, replacing the previous record.
    pub fn save(&self, watermark: DateTime<Utc>) -> Result<(), WatermarkError> {
        let serialized = format_watermark(watermark);

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|source| WatermarkError::Io {
            path: parent.clone(),
            source,
        })?;

        let tmp_path = self.tmp_path();
        self.write_tmp(&tmp_path, serialized.as_bytes())
            .map_err(|source| WatermarkError::Io {
                path: tmp_path.clone(),
                source,
            })?;

        std::fs::rename(&tmp_path, &self.path).map_err(|source| WatermarkError::Io {
            path: self.path.clone(),
            source,
        })?;

        // Directory fsync makes the rename itself durable. Not every
        // platform allows opening a directory, so failure is only logged.
        if let Err(e) = File::open(&parent).and_then(|dir| dir.sync_all()) {
            debug!("Could not fsync {}: {}", parent.display(), e);
        }

        debug!("Saved watermark {} to {}", serialized, self.path.display());
        Ok(())
    }

    /// Remove the record. Returns whether one existed.
    pub fn clear(&self) -> Result<bool, WatermarkError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(WatermarkError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Temp file unique to this process and save call, so concurrent
    /// writers of the same record never share one.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        name.push(format!(".{}.{}.tmp", std::process::id(), seq));
        self.path.with_file_name(name)
    }

    fn write_tmp(&self, tmp_path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }
}

/// Canonical on-disk form of a watermark.
pub fn format_watermark(watermark: DateTime<Utc>) -> String {
    watermark.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Where the starting watermark came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartingPoint {
    /// Supplied by the operator at startup
    Override,
    /// Read from the watermark record
    Persisted,
    /// Neither was available; now minus [`FIRST_RUN_LOOKBACK_SECS`]
    Lookback,
}

impl std::fmt::Display for StartingPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartingPoint::Override => write!(f, "operator override"),
            StartingPoint::Persisted => write!(f, "persisted watermark"),
            StartingPoint::Lookback => write!(f, "first-run lookback"),
        }
    }
}

/// Resolve the cursor the relay starts from.
///
/// An explicit override wins over the persisted value; with neither, the
/// relay starts one lookback window before `now` instead of replaying the
/// whole request history.
pub fn resolve_start(
    override_start: Option<DateTime<Utc>>,
    persisted: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, StartingPoint) {
    if let Some(start) = override_start {
        return (start, StartingPoint::Override);
    }
    if let Some(start) = persisted {
        return (start, StartingPoint::Persisted);
    }
    (
        now - Duration::seconds(FIRST_RUN_LOOKBACK_SECS),
        StartingPoint::Lookback,
    )
}
