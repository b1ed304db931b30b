//! The sync run: authenticate, fetch, archive, recompute stats, stamp state.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use garmin_connect_client::{ActivityRecord, Credentials, GarminClient, GarminError, Session};
use metrics::counter;
use secrecy::ExposeSecret;
use tracing::{error, info, warn};

use crate::archive::{ActivityArchive, write_pretty_json};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::stats::RunningStats;
use crate::sync_state::{SyncStateStore, window_start};

/// Log in with `credentials`. Empty credentials fail before any request.
pub async fn authenticate(
    client: &dyn GarminClient,
    credentials: &Credentials,
) -> SyncResult<Session> {
    if credentials.email.trim().is_empty() || credentials.password.expose_secret().is_empty() {
        return Err(SyncError::Configuration(
            "GARMIN_EMAIL and GARMIN_PASSWORD must both be set".into(),
        ));
    }
    let session = client
        .login(credentials)
        .await
        .map_err(SyncError::Authentication)?;
    info!("authenticated with Garmin Connect");
    Ok(session)
}

/// Listing and detail lookups that degrade to "no data" on failure.
pub struct ActivityFetcher<'a> {
    client: &'a dyn GarminClient,
    session: &'a Session,
    activity_type: &'a str,
}

impl<'a> ActivityFetcher<'a> {
    pub fn new(client: &'a dyn GarminClient, session: &'a Session, activity_type: &'a str) -> Self {
        Self {
            client,
            session,
            activity_type,
        }
    }

    /// Activities of the configured type between `start` and `today`.
    pub async fn list_since(&self, start: NaiveDate, today: NaiveDate) -> Vec<ActivityRecord> {
        match self.client.list_activities(self.session, start, today).await {
            Ok(all) => {
                let total = all.len();
                let kept: Vec<ActivityRecord> = all
                    .into_iter()
                    .filter(|a| a.type_key() == Some(self.activity_type))
                    .collect();
                info!(total, kept = kept.len(), activity_type = %self.activity_type, "listed activities");
                kept
            }
            Err(e) => {
                error!(error = %SyncError::Fetch(e), "activity list unavailable");
                Vec::new()
            }
        }
    }

    pub async fn fetch_detail(&self, activity_id: &str) -> Option<ActivityRecord> {
        match self
            .client
            .get_activity_detail(self.session, activity_id)
            .await
        {
            Ok(detail) => Some(detail),
            Err(e) => {
                warn!(activity_id, error = %SyncError::Fetch(e), "activity detail unavailable");
                None
            }
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub window_start: NaiveDate,
    pub fetched: usize,
    pub new: usize,
    pub updated: usize,
    pub failed: usize,
    pub details_missing: usize,
    pub stats: RunningStats,
}

pub struct SyncJob {
    client: Arc<dyn GarminClient>,
    credentials: Credentials,
    config: SyncConfig,
}

impl SyncJob {
    pub fn new(client: Arc<dyn GarminClient>, credentials: Credentials, config: SyncConfig) -> Self {
        Self {
            client,
            credentials,
            config,
        }
    }

    /// Run one sync as of `now` (local wall-clock time).
    ///
    /// Only configuration and authentication problems are returned as
    /// errors; everything else is logged and counted in the report.
    pub async fn run(&self, now: NaiveDateTime) -> SyncResult<SyncReport> {
        let session = authenticate(self.client.as_ref(), &self.credentials).await?;
        let today = now.date();

        let archive = ActivityArchive::new(self.config.activities_dir());
        if let Err(e) = archive.ensure_dir() {
            error!(error = %e, "cannot create archive directory");
        }
        let state = SyncStateStore::new(self.config.last_sync_file());

        let last_sync = state.read();
        match last_sync {
            Some(last) => info!(last_sync = %last, "resuming from previous sync"),
            None => info!(
                days = self.config.lookback_days,
                "no previous sync found, using default lookback"
            ),
        }
        let start = window_start(last_sync, now, self.config.lookback_days);
        info!(from = %start, to = %today, "fetching activities");

        let fetcher = ActivityFetcher::new(
            self.client.as_ref(),
            &session,
            &self.config.activity_type,
        );
        let summaries = fetcher.list_since(start, today).await;

        let mut report = SyncReport {
            window_start: start,
            fetched: summaries.len(),
            new: 0,
            updated: 0,
            failed: 0,
            details_missing: 0,
            stats: RunningStats::compute(&[], now),
        };

        if summaries.is_empty() {
            info!("no new activities found");
        } else {
            self.store_all(&fetcher, &archive, summaries, today, &mut report)
                .await;
        }

        let all = archive.load_all();
        report.stats = RunningStats::compute(&all, now);
        match write_pretty_json(&self.config.stats_file(), &report.stats) {
            Ok(()) => info!(
                activities = report.stats.total_activities,
                km = report.stats.total_distance_km,
                "statistics updated"
            ),
            Err(e) => error!(error = %e, "statistics not written"),
        }

        if let Err(e) = state.write(now) {
            error!(error = %e, "sync state not written");
        }
        Ok(report)
    }

    async fn store_all(
        &self,
        fetcher: &ActivityFetcher<'_>,
        archive: &ActivityArchive,
        summaries: Vec<ActivityRecord>,
        today: NaiveDate,
        report: &mut SyncReport,
    ) {
        let mut index = archive.index();
        info!(archived = index.len(), "loaded archive index");

        for mut activity in summaries {
            let Some(id) = activity.activity_id() else {
                warn!("listed activity has no activityId; skipping");
                report.failed += 1;
                record_outcome("failed");
                continue;
            };

            match fetcher.fetch_detail(&id).await {
                Some(detail) => activity.merge(detail),
                None => report.details_missing += 1,
            }

            let filename = match ActivityArchive::filename_for(&activity, today) {
                Ok(name) => name,
                Err(e) => {
                    error!(activity_id = %id, error = %e, "cannot archive activity");
                    report.failed += 1;
                    record_outcome("failed");
                    continue;
                }
            };
            if let Some(existing) = index.file_for(&id).filter(|f| *f != filename) {
                warn!(
                    activity_id = %id,
                    existing = %existing,
                    new = %filename,
                    "start date changed; activity will be stored under a second filename"
                );
            }

            let existed = index.contains(&id);
            match archive.upsert(&activity, today) {
                Ok(path) => {
                    if existed {
                        report.updated += 1;
                        record_outcome("updated");
                    } else {
                        report.new += 1;
                        record_outcome("new");
                    }
                    tracing::debug!(activity_id = %id, path = %path.display(), "archived");
                    index.insert(id, filename);
                }
                Err(e) => {
                    error!(activity_id = %id, error = %e, "activity not saved");
                    report.failed += 1;
                    record_outcome("failed");
                }
            }
        }
        info!(new = report.new, updated = report.updated, failed = report.failed, "archive updated");
    }
}

fn record_outcome(outcome: &'static str) {
    counter!("running_sync_activities_total", "outcome" => outcome).increment(1);
}

/// Whether `err` came from a rejected login rather than the network.
pub fn is_rejected_login(err: &SyncError) -> bool {
    matches!(err, SyncError::Authentication(GarminError::Auth(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockClient, credentials, run_record};
    use chrono::NaiveDateTime;
    use secrecy::SecretString;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-06-01 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn job(client: MockClient, dir: &std::path::Path) -> SyncJob {
        SyncJob::new(Arc::new(client), credentials(), SyncConfig::new(dir))
    }

    #[tokio::test]
    async fn empty_password_fails_before_login() {
        let client = MockClient::default();
        let creds = Credentials {
            email: "runner@example.com".into(),
            password: SecretString::new("".into()),
        };
        let err = authenticate(&client, &creds).await.unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
        assert_eq!(client.login_calls(), 0);
    }

    #[tokio::test]
    async fn rejected_login_aborts_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient {
            reject_login: true,
            ..Default::default()
        };
        let err = job(client, dir.path()).run(now()).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(is_rejected_login(&err));
        assert!(!dir.path().join("last-sync.json").exists());
        assert!(!dir.path().join("stats.json").exists());
    }

    #[tokio::test]
    async fn first_run_uses_lookback_and_filters_type() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient {
            listing: Some(vec![
                run_record(1, "running", "2025-05-01 07:00:00", 5000.0, 1500.0),
                run_record(2, "cycling", "2025-05-02 07:00:00", 30000.0, 3600.0),
            ]),
            ..Default::default()
        };
        let job = job(client, dir.path());
        let report = job.run(now()).await.unwrap();

        assert_eq!(report.window_start, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(report.fetched, 1);
        assert_eq!(report.new, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(report.stats.total_activities, 1);
        assert!(dir.path().join("activities/2025-05-01_1.json").exists());
        assert!(dir.path().join("stats.json").exists());
        assert!(dir.path().join("last-sync.json").exists());
    }

    #[tokio::test]
    async fn detail_fields_overwrite_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut details = std::collections::HashMap::new();
        details.insert(
            "1".to_string(),
            serde_json::from_value(json!({"distance": 5100.0, "averageHR": 151})).unwrap(),
        );
        let client = MockClient {
            listing: Some(vec![run_record(1, "running", "2025-05-01 07:00:00", 5000.0, 1500.0)]),
            details,
            ..Default::default()
        };
        job(client, dir.path()).run(now()).await.unwrap();

        let saved = ActivityArchive::new(dir.path().join("activities")).load_all();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].distance(), 5100.0);
        assert_eq!(saved[0].get("averageHR"), Some(&json!(151)));
    }

    #[tokio::test]
    async fn missing_detail_still_saves_summary() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient {
            listing: Some(vec![run_record(9, "running", "2025-05-03 07:00:00", 3000.0, 900.0)]),
            ..Default::default()
        };
        let report = job(client, dir.path()).run(now()).await.unwrap();
        assert_eq!(report.details_missing, 1);
        assert_eq!(report.new, 1);
    }

    #[tokio::test]
    async fn list_failure_still_writes_stats_and_state() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient {
            listing: None,
            ..Default::default()
        };
        let report = job(client, dir.path()).run(now()).await.unwrap();
        assert_eq!(report.fetched, 0);
        assert!(dir.path().join("stats.json").exists());
        assert!(dir.path().join("last-sync.json").exists());
    }

    #[tokio::test]
    async fn existing_id_is_updated_not_new() {
        let dir = tempfile::tempdir().unwrap();
        let config = SyncConfig::new(dir.path());
        ActivityArchive::new(config.activities_dir())
            .upsert(
                &run_record(7, "running", "2025-05-10 07:00:00", 4000.0, 1200.0),
                now().date(),
            )
            .unwrap();

        let client = MockClient {
            listing: Some(vec![
                run_record(7, "running", "2025-05-10 07:00:00", 4200.0, 1200.0),
                run_record(8, "running", "2025-05-11 07:00:00", 6000.0, 1800.0),
            ]),
            ..Default::default()
        };
        let report = job(client, dir.path()).run(now()).await.unwrap();
        assert_eq!(report.new, 1);
        assert_eq!(report.updated, 1);

        let files: Vec<_> = std::fs::read_dir(config.activities_dir())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.contains("_7."))
            .collect();
        assert_eq!(files, vec!["2025-05-10_7.json".to_string()]);
        assert_eq!(report.stats.total_activities, 2);
    }

    #[tokio::test]
    async fn activity_without_id_counts_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let anonymous: ActivityRecord = serde_json::from_value(json!({
            "activityType": {"typeKey": "running"},
            "startTimeLocal": "2025-05-04 07:00:00",
            "distance": 4000.0,
        }))
        .unwrap();
        let client = MockClient {
            listing: Some(vec![
                anonymous,
                run_record(5, "running", "2025-05-05 07:00:00", 5000.0, 1500.0),
            ]),
            ..Default::default()
        };
        let report = job(client, dir.path()).run(now()).await.unwrap();
        assert_eq!(report.fetched, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.new, 1);
        assert_eq!(std::fs::read_dir(dir.path().join("activities")).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn moved_start_date_keeps_old_file_and_counts_update() {
        let dir = tempfile::tempdir().unwrap();
        let config = SyncConfig::new(dir.path());
        ActivityArchive::new(config.activities_dir())
            .upsert(
                &run_record(7, "running", "2025-05-10 07:00:00", 4000.0, 1200.0),
                now().date(),
            )
            .unwrap();

        let client = MockClient {
            listing: Some(vec![run_record(7, "running", "2025-05-11 07:00:00", 4000.0, 1200.0)]),
            ..Default::default()
        };
        let report = job(client, dir.path()).run(now()).await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.new, 0);

        let mut files: Vec<_> = std::fs::read_dir(config.activities_dir())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(files, vec!["2025-05-10_7.json", "2025-05-11_7.json"]);
    }

    #[tokio::test]
    async fn second_run_starts_from_last_sync() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient {
            listing: Some(vec![]),
            ..Default::default()
        };
        let job = job(client, dir.path());
        job.run(now()).await.unwrap();

        let later = NaiveDateTime::parse_from_str("2025-06-03 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let report = job.run(later).await.unwrap();
        assert_eq!(report.window_start, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }
}
