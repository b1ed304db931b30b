//! `last-sync.json` bookkeeping.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::archive::write_pretty_json;
use crate::error::{SyncError, SyncResult};

const LAST_SYNC_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncState {
    /// Local wall-clock time of the run, ISO-8601 without offset.
    pub last_sync: String,
    /// Same instant as Unix seconds.
    pub timestamp: f64,
}

impl SyncState {
    pub fn at(now: NaiveDateTime) -> Self {
        let timestamp = Local
            .from_local_datetime(&now)
            .earliest()
            .map(|dt| dt.timestamp_micros() as f64 / 1_000_000.0)
            .unwrap_or_else(|| now.and_utc().timestamp_micros() as f64 / 1_000_000.0);
        Self {
            last_sync: now.format(LAST_SYNC_FORMAT).to_string(),
            timestamp,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SyncStateStore {
    path: PathBuf,
}

impl SyncStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Instant of the previous run, or `None` when there is no usable state.
    pub fn read(&self) -> Option<NaiveDateTime> {
        match self.try_read() {
            Ok(last) => last,
            Err(e) => {
                warn!(error = %e, "ignoring sync state");
                None
            }
        }
    }

    fn try_read(&self) -> SyncResult<Option<NaiveDateTime>> {
        let body = match fs::read_to_string(&self.path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SyncError::StateRead(e.to_string())),
        };
        let state: SyncState =
            serde_json::from_str(&body).map_err(|e| SyncError::StateRead(e.to_string()))?;
        garmin_connect_client::utils::parse_local_datetime(&state.last_sync)
            .map(Some)
            .ok_or_else(|| SyncError::StateRead(format!("bad last_sync {:?}", state.last_sync)))
    }

    /// Overwrite the state file with `now`.
    pub fn write(&self, now: NaiveDateTime) -> SyncResult<()> {
        write_pretty_json(&self.path, &SyncState::at(now))
    }
}

/// First day of the fetch window: the previous sync's date, or
/// `lookback_days` before `now` when there is none.
pub fn window_start(last_sync: Option<NaiveDateTime>, now: NaiveDateTime, lookback_days: i64) -> NaiveDate {
    match last_sync {
        Some(last) => last.date(),
        None => (now - Duration::days(lookback_days)).date(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SyncStateStore::new(dir.path().join("last-sync.json"));
        assert!(store.read().is_none());
    }

    #[test]
    fn corrupt_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last-sync.json");
        fs::write(&path, "{\"last_sync\": 12}").unwrap();
        assert!(SyncStateStore::new(&path).read().is_none());
        fs::write(&path, "{\"last_sync\": \"yesterday\", \"timestamp\": 0}").unwrap();
        assert!(SyncStateStore::new(&path).read().is_none());
    }

    #[test]
    fn write_then_read_round_trips_wall_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = SyncStateStore::new(dir.path().join("nested/last-sync.json"));
        let now = at("2025-06-01 08:15:30");
        store.write(now).unwrap();
        assert_eq!(store.read(), Some(now));

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["last_sync"], "2025-06-01T08:15:30.000000");
        assert!(raw["timestamp"].as_f64().unwrap() > 1.7e9);
    }

    #[test]
    fn window_defaults_to_lookback() {
        let now = at("2025-06-01 08:15:30");
        assert_eq!(
            window_start(None, now, 365),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
    }

    #[test]
    fn window_starts_at_last_sync_date() {
        let now = at("2025-06-01 08:15:30");
        let last = at("2025-05-20 23:59:00");
        assert_eq!(
            window_start(Some(last), now, 365),
            NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
        );
    }
}
