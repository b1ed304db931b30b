//! Minimal `GarminClient` trait and the activity record model it returns.

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod config;
pub mod http_client;
pub mod observability;
pub mod utils;

#[derive(Debug, Error)]
pub enum GarminError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl GarminError {
    pub fn from_status(status: u16, message: String) -> Self {
        GarminError::Api { status, message }
    }
}

/// Login identity and secret for the Garmin Connect account.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// Authenticated session handle returned by [`GarminClient::login`].
#[derive(Clone, Debug)]
pub struct Session {
    pub access_token: SecretString,
    pub display_name: Option<String>,
}

/// An activity as returned by the API.
///
/// The API payload is open-ended; only a handful of fields are read through
/// typed accessors and everything else is carried verbatim.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct ActivityRecord(Map<String, Value>);

impl ActivityRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// `activityId` coerced to a string. Integral floats such as `5.0` are
    /// rendered as `5`.
    pub fn activity_id(&self) -> Option<String> {
        match self.0.get("activityId")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
                    Some((f as i64).to_string())
                }
                _ => Some(n.to_string()),
            },
            _ => None,
        }
    }

    pub fn type_key(&self) -> Option<&str> {
        self.0
            .get("activityType")
            .and_then(|t| t.get("typeKey"))
            .and_then(Value::as_str)
    }

    pub fn start_time_local(&self) -> Option<&str> {
        self.0
            .get("startTimeLocal")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Calendar date portion of `startTimeLocal`.
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_time_local().and_then(utils::parse_local_date)
    }

    /// Meters.
    pub fn distance(&self) -> f64 {
        self.number("distance")
    }

    /// Seconds.
    pub fn elapsed_duration(&self) -> f64 {
        self.number("elapsedDuration")
    }

    /// Meters.
    pub fn elevation_gain(&self) -> f64 {
        self.number("elevationGain")
    }

    pub fn calories(&self) -> f64 {
        self.number("calories")
    }

    /// Overlay `detail` onto this record; keys present in both take the
    /// detail's value.
    pub fn merge(&mut self, detail: ActivityRecord) {
        for (key, value) in detail.0 {
            self.0.insert(key, value);
        }
    }

    fn number(&self, key: &str) -> f64 {
        self.0.get(key).and_then(Value::as_f64).unwrap_or(0.0)
    }
}


#[async_trait]
pub trait GarminClient: Send + Sync + 'static {
    /// Exchange credentials for a session.
    async fn login(&self, credentials: &Credentials) -> Result<Session, GarminError>;

    /// All activities (every type) whose start date lies in `start..=end`.
    async fn list_activities(
        &self,
        session: &Session,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ActivityRecord>, GarminError>;

    /// Full detail for a single activity.
    async fn get_activity_detail(
        &self,
        session: &Session,
        activity_id: &str,
    ) -> Result<ActivityRecord, GarminError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> ActivityRecord {
        serde_json::from_value(value).expect("record")
    }

    #[test]
    fn activity_id_from_number() {
        let r = record(json!({"activityId": 12345678901u64}));
        assert_eq!(r.activity_id().as_deref(), Some("12345678901"));
    }

    #[test]
    fn activity_id_from_integral_float() {
        assert_eq!(record(json!({"activityId": 5.0})).activity_id().as_deref(), Some("5"));
        assert_eq!(record(json!({"activityId": 5.5})).activity_id().as_deref(), Some("5.5"));
    }

    #[test]
    fn activity_id_from_string() {
        let r = record(json!({"activityId": "abc"}));
        assert_eq!(r.activity_id().as_deref(), Some("abc"));
    }

    #[test]
    fn activity_id_rejects_nested_or_empty() {
        assert!(record(json!({"activityId": {"x": 1}})).activity_id().is_none());
        assert!(record(json!({"activityId": ""})).activity_id().is_none());
        assert!(record(json!({})).activity_id().is_none());
    }

    #[test]
    fn numeric_fields_default_to_zero() {
        let r = record(json!({"distance": null, "calories": "lots"}));
        assert_eq!(r.distance(), 0.0);
        assert_eq!(r.calories(), 0.0);
        assert_eq!(r.elapsed_duration(), 0.0);
        assert_eq!(r.elevation_gain(), 0.0);
    }

    #[test]
    fn type_key_reads_nested_field() {
        let r = record(json!({"activityType": {"typeKey": "running", "typeId": 1}}));
        assert_eq!(r.type_key(), Some("running"));
        assert_eq!(record(json!({"activityType": null})).type_key(), None);
    }

    #[test]
    fn merge_prefers_detail_values() {
        let mut summary = record(json!({"activityId": 1, "distance": 5000.0, "name": "Morning"}));
        let detail = record(json!({"distance": 5012.5, "laps": [1, 2]}));
        summary.merge(detail);
        assert_eq!(summary.distance(), 5012.5);
        assert_eq!(summary.get("name"), Some(&json!("Morning")));
        assert_eq!(summary.get("laps"), Some(&json!([1, 2])));
    }

    #[test]
    fn start_date_from_space_separated_timestamp() {
        let r = record(json!({"startTimeLocal": "2024-01-15 10:30:00"}));
        assert_eq!(r.start_date(), NaiveDate::from_ymd_opt(2024, 1, 15));
    }
}
