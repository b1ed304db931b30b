//! One-JSON-file-per-activity archive.
//!
//! Files are named `<YYYY-MM-DD>_<activityId>.json`. The directory is the only
//! source of truth: identity is recovered by reading each file's embedded
//! `activityId`, never from an external index.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use garmin_connect_client::ActivityRecord;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};

/// Write `value` as 2-space indented UTF-8 JSON, creating parent directories.
pub(crate) fn write_pretty_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> SyncResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SyncError::persist(parent, e))?;
    }
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body).map_err(|e| SyncError::persist(path, e))
}

/// In-memory `activityId -> filename` map built from a single directory scan.
#[derive(Debug, Default, Clone)]
pub struct ArchiveIndex {
    files: HashMap<String, String>,
}

impl ArchiveIndex {
    pub fn contains(&self, activity_id: &str) -> bool {
        self.files.contains_key(activity_id)
    }

    pub fn file_for(&self, activity_id: &str) -> Option<&str> {
        self.files.get(activity_id).map(String::as_str)
    }

    pub fn insert(&mut self, activity_id: String, filename: String) {
        self.files.insert(activity_id, filename);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct ActivityArchive {
    dir: PathBuf,
}

impl ActivityArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn ensure_dir(&self) -> SyncResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| SyncError::persist(&self.dir, e))
    }

    /// Every parsable record in the archive. Unreadable files are skipped.
    pub fn load_all(&self) -> Vec<ActivityRecord> {
        self.scan().into_iter().map(|(_, record)| record).collect()
    }

    /// Build the id index from the files currently on disk.
    pub fn index(&self) -> ArchiveIndex {
        let mut index = ArchiveIndex::default();
        for (filename, record) in self.scan() {
            match record.activity_id() {
                Some(id) => index.insert(id, filename),
                None => debug!(file = %filename, "archived record has no activityId"),
            }
        }
        index
    }

    /// Filename the record is stored under.
    ///
    /// The date comes from `startTimeLocal`; `today` is used when it is absent
    /// or unparsable.
    pub fn filename_for(record: &ActivityRecord, today: NaiveDate) -> SyncResult<String> {
        let id = record
            .activity_id()
            .ok_or_else(|| SyncError::InvalidRecord("record has no activityId".into()))?;
        if id.contains(['/', '\\']) || id.contains("..") {
            return Err(SyncError::InvalidRecord(format!(
                "activityId {id:?} is not usable in a filename"
            )));
        }
        let date = record.start_date().unwrap_or(today);
        Ok(format!("{}_{}.json", date.format("%Y-%m-%d"), id))
    }

    /// Write `record`, replacing any file with the same derived name.
    pub fn upsert(&self, record: &ActivityRecord, today: NaiveDate) -> SyncResult<PathBuf> {
        let path = self.dir.join(Self::filename_for(record, today)?);
        write_pretty_json(&path, record)?;
        Ok(path)
    }

    fn scan(&self) -> Vec<(String, ActivityRecord)> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "cannot read archive directory");
                return Vec::new();
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut out = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned)
            else {
                continue;
            };
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|body| {
                    serde_json::from_str::<ActivityRecord>(&body).map_err(|e| e.to_string())
                });
            match parsed {
                Ok(record) => out.push((filename, record)),
                Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable activity file"),
            }
        }
        out
    }
}
