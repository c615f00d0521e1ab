//! Recurring scan scheduling
//!
//! A single tick loop owns every schedule entry. Each tick collects the
//! entries whose `next_run_at` has passed and submits a job for each.
//! A submission suppressed by the duplicate guard still advances
//! `next_run_at`, so a stuck or long-running job delays the next
//! occurrence instead of piling up retries.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SiteGradeError;
use crate::fetch::normalize_target;
use crate::jobs::JobRunner;
use crate::models::Category;
use serde::{Deserialize, Serialize};

/// How often the tick loop wakes up to look for due entries
pub const TICK_PERIOD: Duration = Duration::from_secs(60);

/// Recurrence tiers for scheduled scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanFrequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl ScanFrequency {
    pub fn as_chrono(&self) -> chrono::Duration {
        match self {
            ScanFrequency::Hourly => chrono::Duration::hours(1),
            ScanFrequency::Daily => chrono::Duration::days(1),
            ScanFrequency::Weekly => chrono::Duration::weeks(1),
            ScanFrequency::Monthly => chrono::Duration::days(30),
        }
    }
}

impl std::str::FromStr for ScanFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hourly" => Ok(ScanFrequency::Hourly),
            "daily" => Ok(ScanFrequency::Daily),
            "weekly" => Ok(ScanFrequency::Weekly),
            "monthly" => Ok(ScanFrequency::Monthly),
            other => Err(format!(
                "unknown frequency '{other}' (expected hourly, daily, weekly, monthly)"
            )),
        }
    }
}

/// One recurring scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub target: String,
    pub categories: Vec<Category>,
    pub frequency: ScanFrequency,
    pub next_run_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
}

/// Drives recurring scans through the job runner
pub struct Scheduler {
    runner: Arc<JobRunner>,
    entries: DashMap<Uuid, ScheduleEntry>,
}

impl Scheduler {
    pub fn new(runner: Arc<JobRunner>) -> Self {
        Self {
            runner,
            entries: DashMap::new(),
        }
    }

    /// Add a recurring scan; the first run is due immediately
    pub fn add_schedule(
        &self,
        target: &str,
        categories: Vec<Category>,
        frequency: ScanFrequency,
    ) -> Result<ScheduleEntry, SiteGradeError> {
        let url = normalize_target(target)?;
        let entry = ScheduleEntry {
            id: Uuid::new_v4(),
            target: url.to_string(),
            categories,
            frequency,
            next_run_at: Utc::now(),
            last_run_at: None,
        };
        info!("scheduled {:?} scan for {}", frequency, entry.target);
        self.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    pub fn remove_schedule(&self, id: Uuid) -> Result<(), SiteGradeError> {
        self.entries
            .remove(&id)
            .map(|_| ())
            .ok_or(SiteGradeError::JobNotFound(id))
    }

    pub fn schedules(&self) -> Vec<ScheduleEntry> {
        self.entries.iter().map(|entry| entry.clone()).collect()
    }

    /// Submit every entry due at `now` and advance its next occurrence.
    ///
    /// Returns how many submissions were accepted. A duplicate-job
    /// rejection means the previous run is still in flight; the entry
    /// advances anyway so the backlog never grows.
    pub fn run_due_once(&self, now: DateTime<Utc>) -> usize {
        let due: Vec<Uuid> = self
            .entries
            .iter()
            .filter(|entry| entry.next_run_at <= now)
            .map(|entry| entry.id)
            .collect();

        let mut submitted = 0;
        for id in due {
            let (target, categories, frequency) = match self.entries.get(&id) {
                Some(entry) => (
                    entry.target.clone(),
                    entry.categories.clone(),
                    entry.frequency,
                ),
                None => continue,
            };
            match self.runner.submit(&target, categories) {
                Ok(job_id) => {
                    debug!("schedule {} submitted job {}", id, job_id);
                    submitted += 1;
                }
                Err(SiteGradeError::DuplicateJob { .. }) => {
                    warn!("schedule {} skipped, {} already in flight", id, target);
                }
                Err(err) => {
                    warn!("schedule {} failed to submit: {}", id, err);
                }
            }
            if let Some(mut entry) = self.entries.get_mut(&id) {
                entry.last_run_at = Some(now);
                entry.next_run_at = now + frequency.as_chrono();
            }
        }
        submitted
    }

    /// Tick until the token is cancelled
    pub async fn run(self: Arc<Self>, token: CancellationToken) {
        let mut ticker = tokio::time::interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    self.run_due_once(Utc::now());
                }
            }
        }
        debug!("scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::MockFetcher;
    use crate::engine::AnalysisEngine;
    use crate::jobs::test_support::RecordingNotifier;
    use crate::jobs::JobStore;
    use std::collections::HashMap;

    fn scheduler() -> (Scheduler, Arc<JobRunner>) {
        let engine = Arc::new(AnalysisEngine::new(
            Arc::new(MockFetcher::page("<html></html>")),
            HashMap::new(),
        ));
        let runner = Arc::new(JobRunner::new(
            engine,
            Arc::new(JobStore::new()),
            Arc::new(RecordingNotifier::default()),
        ));
        (Scheduler::new(runner.clone()), runner)
    }

    #[tokio::test]
    async fn due_entry_submits_and_advances() {
        let (scheduler, runner) = scheduler();
        let entry = scheduler
            .add_schedule("example.com", vec![Category::Seo], ScanFrequency::Daily)
            .unwrap();
        assert_eq!(entry.target, "https://example.com/");

        let now = Utc::now();
        assert_eq!(scheduler.run_due_once(now), 1);
        assert_eq!(runner.store().list().len(), 1);

        let after = scheduler.schedules().pop().unwrap();
        assert_eq!(after.next_run_at, now + chrono::Duration::days(1));
        assert_eq!(after.last_run_at, Some(now));
    }

    #[tokio::test]
    async fn future_entry_is_left_alone() {
        let (scheduler, runner) = scheduler();
        scheduler
            .add_schedule("example.com", vec![Category::Seo], ScanFrequency::Hourly)
            .unwrap();
        scheduler.run_due_once(Utc::now());
        // already advanced an hour, the next tick finds nothing due
        assert_eq!(scheduler.run_due_once(Utc::now()), 0);
        assert_eq!(runner.store().list().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_suppression_still_advances() {
        let (scheduler, runner) = scheduler();
        let a = scheduler
            .add_schedule("example.com", vec![Category::Seo], ScanFrequency::Hourly)
            .unwrap();
        // a second schedule for the same target key
        scheduler
            .add_schedule("example.com/", vec![Category::Gdpr], ScanFrequency::Hourly)
            .unwrap();

        let now = Utc::now();
        // only one submission can win the in-flight slot
        assert_eq!(scheduler.run_due_once(now), 1);
        assert_eq!(runner.store().list().len(), 1);
        // but both entries advanced
        for entry in scheduler.schedules() {
            assert_eq!(entry.next_run_at, now + chrono::Duration::hours(1));
        }
        let _ = a;
    }

    #[tokio::test]
    async fn removed_schedule_stops_firing() {
        let (scheduler, runner) = scheduler();
        let entry = scheduler
            .add_schedule("example.com", vec![Category::Seo], ScanFrequency::Hourly)
            .unwrap();
        scheduler.remove_schedule(entry.id).unwrap();
        assert_eq!(scheduler.run_due_once(Utc::now()), 0);
        assert!(runner.store().list().is_empty());
        assert!(matches!(
            scheduler.remove_schedule(entry.id),
            Err(SiteGradeError::JobNotFound(_))
        ));
    }
}
