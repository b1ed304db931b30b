//! Queries over the local archive.

use chrono::NaiveDateTime;
use garmin_connect_client::ActivityRecord;
use garmin_connect_client::utils::parse_local_datetime;

use crate::stats::pace_min_per_km;

/// Optional bounds; all present bounds must hold for a record to match.
/// Distances are kilometers and paces minutes per kilometer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ActivityFilters {
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub min_distance_km: Option<f64>,
    pub max_distance_km: Option<f64>,
    pub min_pace: Option<f64>,
    pub max_pace: Option<f64>,
}

impl ActivityFilters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, record: &ActivityRecord) -> bool {
        if self.start_date.is_some() || self.end_date.is_some() {
            let Some(started) = start_of(record) else {
                return false;
            };
            if self.start_date.is_some_and(|from| started < from) {
                return false;
            }
            if self.end_date.is_some_and(|to| started > to) {
                return false;
            }
        }

        let km = record.distance() / 1000.0;
        if self.min_distance_km.is_some_and(|min| km < min) {
            return false;
        }
        if self.max_distance_km.is_some_and(|max| km > max) {
            return false;
        }

        if self.min_pace.is_some() || self.max_pace.is_some() {
            let pace = pace_min_per_km(record.elapsed_duration(), record.distance()).unwrap_or(0.0);
            if self.min_pace.is_some_and(|min| pace < min) {
                return false;
            }
            if self.max_pace.is_some_and(|max| pace > max) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, records: Vec<ActivityRecord>) -> Vec<ActivityRecord> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

fn start_of(record: &ActivityRecord) -> Option<NaiveDateTime> {
    record.start_time_local().and_then(parse_local_datetime)
}

/// Newest first; records without a start time sort last.
pub fn sort_newest_first(records: &mut [ActivityRecord]) {
    records.sort_by_key(|r| std::cmp::Reverse(start_of(r)));
}

/// The `limit` most recent records.
pub fn recent(mut records: Vec<ActivityRecord>, limit: usize) -> Vec<ActivityRecord> {
    sort_newest_first(&mut records);
    records.truncate(limit);
    records
}
