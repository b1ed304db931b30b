//! Aggregate statistics over the whole archive.

use chrono::NaiveDateTime;
use garmin_connect_client::ActivityRecord;
use serde::{Deserialize, Serialize};

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Minutes per kilometer, or `None` when `distance_m` is not positive.
pub fn pace_min_per_km(elapsed_s: f64, distance_m: f64) -> Option<f64> {
    (distance_m > 0.0).then(|| (elapsed_s / 60.0) / (distance_m / 1000.0))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalRecords {
    pub longest_distance_km: f64,
    /// Absent when no activity has a positive distance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fastest_pace_min_per_km: Option<f64>,
}

/// Snapshot written to `stats.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunningStats {
    pub total_activities: usize,
    pub total_distance_km: f64,
    pub total_time_seconds: f64,
    pub total_time_hours: f64,
    /// Weighted over all activities: total minutes / total km.
    pub average_pace_min_per_km: f64,
    pub total_elevation_gain_m: f64,
    pub total_calories: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_records: Option<PersonalRecords>,
    pub last_updated: String,
}

impl RunningStats {
    pub fn compute(records: &[ActivityRecord], now: NaiveDateTime) -> Self {
        let last_updated = now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        if records.is_empty() {
            return Self {
                total_activities: 0,
                total_distance_km: 0.0,
                total_time_seconds: 0.0,
                total_time_hours: 0.0,
                average_pace_min_per_km: 0.0,
                total_elevation_gain_m: 0.0,
                total_calories: 0.0,
                personal_records: None,
                last_updated,
            };
        }

        let totals = Totals::over(records);
        let longest_distance_km = records
            .iter()
            .map(ActivityRecord::distance)
            .fold(0.0_f64, f64::max)
            / 1000.0;
        let fastest_pace_min_per_km = records
            .iter()
            .filter_map(|r| pace_min_per_km(r.elapsed_duration(), r.distance()))
            .reduce(f64::min);

        Self {
            total_activities: records.len(),
            total_distance_km: round2(totals.distance_km()),
            total_time_seconds: totals.elapsed_s,
            total_time_hours: round2(totals.elapsed_s / 3600.0),
            average_pace_min_per_km: round2(totals.weighted_pace()),
            total_elevation_gain_m: round2(totals.elevation_m),
            total_calories: totals.calories,
            personal_records: Some(PersonalRecords {
                longest_distance_km,
                fastest_pace_min_per_km,
            }),
            last_updated,
        }
    }
}

/// Running sums shared with the period summaries.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Totals {
    pub distance_m: f64,
    pub elapsed_s: f64,
    pub elevation_m: f64,
    pub calories: f64,
}

impl Totals {
    pub fn over<'a>(records: impl IntoIterator<Item = &'a ActivityRecord>) -> Self {
        records.into_iter().fold(Self::default(), |mut acc, r| {
            acc.distance_m += r.distance();
            acc.elapsed_s += r.elapsed_duration();
            acc.elevation_m += r.elevation_gain();
            acc.calories += r.calories();
            acc
        })
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    pub fn weighted_pace(&self) -> f64 {
        pace_min_per_km(self.elapsed_s, self.distance_m).unwrap_or(0.0)
    }
}
