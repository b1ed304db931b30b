use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "data/running";
pub const DEFAULT_ACTIVITY_TYPE: &str = "running";
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Storage layout and fetch parameters for one sync run.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub data_dir: PathBuf,
    /// `activityType.typeKey` kept by the fetcher.
    pub activity_type: String,
    /// Window used when no previous sync is recorded.
    pub lookback_days: i64,
}

impl SyncConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            activity_type: DEFAULT_ACTIVITY_TYPE.into(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    pub fn from_env() -> Self {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    pub fn from_env_with<F>(mut get: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let data_dir = get("RUNNING_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.into());
        let mut cfg = Self::new(data_dir);
        if let Some(kind) = get("RUNNING_ACTIVITY_TYPE").filter(|v| !v.trim().is_empty()) {
            cfg.activity_type = kind;
        }
        cfg
    }

    pub fn activities_dir(&self) -> PathBuf {
        self.data_dir.join("activities")
    }

    pub fn stats_file(&self) -> PathBuf {
        self.data_dir.join("stats.json")
    }

    pub fn last_sync_file(&self) -> PathBuf {
        self.data_dir.join("last-sync.json")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
