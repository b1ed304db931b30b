//! Garmin Connect running-activity sync.
//!
//! A run authenticates, lists activities since the last sync, merges each
//! summary with its detail record, writes one JSON file per activity and then
//! recomputes `stats.json` over the whole archive.

pub mod archive;
pub mod config;
pub mod error;
pub mod filters;
pub mod stats;
pub mod summaries;
pub mod sync;
pub mod sync_state;

mod test_utils;

pub use archive::{ActivityArchive, ArchiveIndex};
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use filters::ActivityFilters;
pub use stats::{PersonalRecords, RunningStats};
pub use summaries::{MonthlySummary, WeeklySummary, monthly_summaries, weekly_summaries};
pub use sync::{ActivityFetcher, SyncJob, SyncReport, authenticate};
pub use sync_state::{SyncState, SyncStateStore};
