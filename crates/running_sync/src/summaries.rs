//! Weekly and monthly rollups of archived activities.

use chrono::{Datelike, Duration, Months, NaiveDate};
use garmin_connect_client::ActivityRecord;
use serde::{Deserialize, Serialize};

use crate::stats::{Totals, round2};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklySummary {
    /// ISO week label, e.g. `2025-W07`.
    pub week: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub activities: usize,
    pub distance_km: f64,
    pub time_hours: f64,
    pub average_pace_min_per_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlySummary {
    /// `YYYY-MM`.
    pub month: String,
    pub activities: usize,
    pub distance_km: f64,
    pub time_hours: f64,
    pub average_pace_min_per_km: f64,
}

struct Bucket {
    activities: usize,
    distance_km: f64,
    time_hours: f64,
    average_pace_min_per_km: f64,
}

fn bucket(records: &[ActivityRecord], from: NaiveDate, to: NaiveDate) -> Bucket {
    let inside: Vec<&ActivityRecord> = records
        .iter()
        .filter(|r| r.start_date().is_some_and(|d| d >= from && d <= to))
        .collect();
    let totals = Totals::over(inside.iter().copied());
    Bucket {
        activities: inside.len(),
        distance_km: round2(totals.distance_km()),
        time_hours: round2(totals.elapsed_s / 3600.0),
        average_pace_min_per_km: round2(totals.weighted_pace()),
    }
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    date.checked_sub_signed(Duration::days(date.weekday().num_days_from_monday() as i64))
        .unwrap_or(date)
}

/// Monday-based weeks covering the last `weeks` weeks up to `today`.
/// Weeks without activities are left out.
pub fn weekly_summaries(records: &[ActivityRecord], weeks: u32, today: NaiveDate) -> Vec<WeeklySummary> {
    if records.is_empty() {
        return Vec::new();
    }
    let Some(mut start) = Duration::try_weeks(weeks as i64)
        .and_then(|span| today.checked_sub_signed(span))
        .map(monday_of)
    else {
        return Vec::new();
    };
    let mut out = Vec::new();
    while start <= today {
        let end = start + Duration::days(6);
        let b = bucket(records, start, end);
        if b.activities > 0 {
            let iso = start.iso_week();
            out.push(WeeklySummary {
                week: format!("{}-W{:02}", iso.year(), iso.week()),
                start_date: start,
                end_date: end,
                activities: b.activities,
                distance_km: b.distance_km,
                time_hours: b.time_hours,
                average_pace_min_per_km: b.average_pace_min_per_km,
            });
        }
        start = end + Duration::days(1);
    }
    out
}

/// Calendar months from `months` months before `today` through the current
/// month. Months without activities are left out.
pub fn monthly_summaries(records: &[ActivityRecord], months: u32, today: NaiveDate) -> Vec<MonthlySummary> {
    if records.is_empty() {
        return Vec::new();
    }
    let this_month = today.with_day(1).unwrap_or(today);
    let Some(mut start) = this_month.checked_sub_months(Months::new(months)) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    while start <= this_month {
        let Some(next) = start.checked_add_months(Months::new(1)) else {
            break;
        };
        let end = next - Duration::days(1);
        let b = bucket(records, start, end);
        if b.activities > 0 {
            out.push(MonthlySummary {
                month: start.format("%Y-%m").to_string(),
                activities: b.activities,
                distance_km: b.distance_km,
                time_hours: b.time_hours,
                average_pace_min_per_km: b.average_pace_min_per_km,
            });
        }
        start = next;
    }
    out
}
