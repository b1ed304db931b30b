//! Shared test utilities and a mock `GarminClient` used by unit tests.
#![cfg(test)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use garmin_connect_client::{ActivityRecord, Credentials, GarminClient, GarminError, Session};
use secrecy::SecretString;
use serde_json::json;

/// Canned responses. `listing: None` makes the list call fail; ids missing
/// from `details` make the detail call fail.
#[derive(Default)]
pub struct MockClient {
    pub reject_login: bool,
    pub listing: Option<Vec<ActivityRecord>>,
    pub details: HashMap<String, ActivityRecord>,
    pub(crate) logins: AtomicUsize,
}

impl MockClient {
    pub fn login_calls(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GarminClient for MockClient {
    async fn login(&self, _credentials: &Credentials) -> Result<Session, GarminError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if self.reject_login {
            return Err(GarminError::Auth("invalid credentials".into()));
        }
        Ok(Session {
            access_token: SecretString::new("mock-token".into()),
            display_name: Some("mock".into()),
        })
    }

    async fn list_activities(
        &self,
        _session: &Session,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<ActivityRecord>, GarminError> {
        self.listing
            .clone()
            .ok_or_else(|| GarminError::from_status(503, "unavailable".into()))
    }

    async fn get_activity_detail(
        &self,
        _session: &Session,
        activity_id: &str,
    ) -> Result<ActivityRecord, GarminError> {
        self.details
            .get(activity_id)
            .cloned()
            .ok_or_else(|| GarminError::NotFound(activity_id.to_string()))
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        email: "runner@example.com".into(),
        password: SecretString::new("hunter2".into()),
    }
}

pub fn run_record(id: u64, type_key: &str, start: &str, distance: f64, elapsed: f64) -> ActivityRecord {
    serde_json::from_value(json!({
        "activityId": id,
        "activityType": {"typeKey": type_key},
        "startTimeLocal": start,
        "distance": distance,
        "elapsedDuration": elapsed,
    }))
    .expect("activity record")
}
