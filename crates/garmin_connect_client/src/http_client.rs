//! HTTP client implementation for the Garmin Connect API.
//!
//! This module provides a reqwest-based implementation of the [`GarminClient`](crate::GarminClient) trait.

use crate::observability::track;
use crate::{ActivityRecord, Credentials, GarminClient, GarminError, Session};
use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

const SIGNIN_PATH: &str = "/sso/signin";
const ACTIVITY_SEARCH_PATH: &str = "/activitylist-service/activities/search/activities";
const ACTIVITY_DETAIL_PATH: &str = "/activity-service/activity";

#[derive(Serialize)]
struct SigninRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SigninResponse {
    access_token: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Client for the Garmin Connect API using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestGarminClient {
    base_url: String,
    client: reqwest::Client,
}

impl ReqwestGarminClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the API (e.g., "https://connectapi.garmin.com")
    pub fn new(base_url: &str) -> Result<Self, GarminError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("running-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build an authenticated GET request.
    fn get_request(&self, session: &Session, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(session.access_token.expose_secret())
    }

    /// Execute a request and expect a JSON response.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GarminError> {
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        Ok(resp.json::<T>().await?)
    }

    /// Extract error information from a failed response.
    async fn error_from_response(&self, resp: reqwest::Response) -> GarminError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();

        match status {
            404 => GarminError::NotFound(body_snippet),
            401 | 403 => GarminError::Auth(body_snippet),
            _ => GarminError::from_status(status, body_snippet),
        }
    }
}

#[async_trait]
impl GarminClient for ReqwestGarminClient {
    async fn login(&self, credentials: &Credentials) -> Result<Session, GarminError> {
        let url = format!("{}{}", self.base_url, SIGNIN_PATH);
        let body = SigninRequest {
            username: &credentials.email,
            password: credentials.password.expose_secret(),
        };
        let request = self.client.post(&url).json(&body);
        let resp: SigninResponse = track("login", self.execute_json(request).await)?;
        if resp.access_token.is_empty() {
            return Err(GarminError::Auth("empty access token".into()));
        }
        tracing::debug!(display_name = ?resp.display_name, "signed in");
        Ok(Session {
            access_token: SecretString::new(resp.access_token.into()),
            display_name: resp.display_name,
        })
    }

    async fn list_activities(
        &self,
        session: &Session,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ActivityRecord>, GarminError> {
        let url = format!("{}{}", self.base_url, ACTIVITY_SEARCH_PATH);
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();
        let qp = [("startDate", start.as_str()), ("endDate", end.as_str())];

        track(
            "list_activities",
            self.execute_json(self.get_request(session, &url).query(&qp))
                .await,
        )
    }

    async fn get_activity_detail(
        &self,
        session: &Session,
        activity_id: &str,
    ) -> Result<ActivityRecord, GarminError> {
        if activity_id.is_empty() {
            return Err(GarminError::Config("activity id is empty".into()));
        }
        let url = format!("{}{}/{}", self.base_url, ACTIVITY_DETAIL_PATH, activity_id);
        track(
            "get_activity_detail",
            self.execute_json(self.get_request(session, &url)).await,
        )
    }
}
