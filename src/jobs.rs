//! Job execution state machine
//!
//! A job moves pending -> running -> completed | failed and never
//! leaves a terminal state. At most one job per target is in flight at
//! a time; the in-flight index is keyed by the trailing-slash
//! insensitive form of the normalized URL, so `https://a.com` and
//! `https://a.com/` contend for the same slot. Terminal transitions
//! emit a notification; the notification is fire-and-forget and its
//! fate never changes the job record.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{error, info};
use url::Url;
use uuid::Uuid;

use crate::engine::AnalysisEngine;
use crate::error::SiteGradeError;
use crate::fetch::{normalize_target, target_key};
use crate::models::{Category, JobRecord, JobState, Notification, NotificationKind};

/// Sink for terminal-transition events
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Notifier that writes events to the log
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) {
        info!(
            "[{:?}] {} ({}): {}",
            notification.kind, notification.target, notification.subject_id, notification.summary
        );
    }
}

/// In-memory job records plus the per-target in-flight index
pub struct JobStore {
    jobs: DashMap<Uuid, JobRecord>,
    in_flight: DashMap<String, Uuid>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
            in_flight: DashMap::new(),
        }
    }

    /// Claim the in-flight slot for a target key.
    ///
    /// The entry API makes the check-and-claim atomic, so two
    /// concurrent submissions for one target cannot both pass.
    fn reserve(&self, key: &str, target: &str, id: Uuid) -> Result<(), SiteGradeError> {
        match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(_) => Err(SiteGradeError::DuplicateJob {
                target: target.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }

    fn release(&self, key: &str) {
        self.in_flight.remove(key);
    }

    pub fn get(&self, id: Uuid) -> Option<JobRecord> {
        self.jobs.get(&id).map(|record| record.clone())
    }

    pub fn list(&self) -> Vec<JobRecord> {
        self.jobs.iter().map(|entry| entry.clone()).collect()
    }

    fn insert(&self, record: JobRecord) {
        self.jobs.insert(record.id, record);
    }

    fn mark_running(&self, id: Uuid) {
        if let Some(mut record) = self.jobs.get_mut(&id) {
            record.state = JobState::Running;
            record.started_at = Some(Utc::now());
        }
    }

    fn mark_completed(&self, id: Uuid, result: crate::models::Analysis, duration_ms: u64) {
        if let Some(mut record) = self.jobs.get_mut(&id) {
            record.state = JobState::Completed;
            record.result = Some(result);
            record.error = None;
            record.duration_ms = Some(duration_ms);
            record.finished_at = Some(Utc::now());
        }
    }

    fn mark_failed(&self, id: Uuid, message: String, duration_ms: u64) {
        if let Some(mut record) = self.jobs.get_mut(&id) {
            record.state = JobState::Failed;
            record.result = None;
            record.error = Some(message);
            record.duration_ms = Some(duration_ms);
            record.finished_at = Some(Utc::now());
        }
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Submits jobs and drives each one through its lifecycle
pub struct JobRunner {
    engine: Arc<AnalysisEngine>,
    store: Arc<JobStore>,
    notifier: Arc<dyn Notifier>,
}

impl JobRunner {
    pub fn new(engine: Arc<AnalysisEngine>, store: Arc<JobStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            engine,
            store,
            notifier,
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Queue a job and run it in the background.
    ///
    /// Fails fast with `DuplicateJob` when the target already has a
    /// pending or running job.
    pub fn submit(
        self: &Arc<Self>,
        target: &str,
        categories: Vec<Category>,
    ) -> Result<Uuid, SiteGradeError> {
        let (id, url, key) = self.enqueue(target, categories)?;
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            runner.run(id, url, key).await;
        });
        Ok(id)
    }

    /// Queue a job, run it inline, and return the terminal record
    pub async fn run_to_completion(
        &self,
        target: &str,
        categories: Vec<Category>,
    ) -> Result<JobRecord, SiteGradeError> {
        let (id, url, key) = self.enqueue(target, categories)?;
        self.run(id, url, key).await;
        self.store
            .get(id)
            .ok_or(SiteGradeError::JobNotFound(id))
    }

    fn enqueue(
        &self,
        target: &str,
        categories: Vec<Category>,
    ) -> Result<(Uuid, Url, String), SiteGradeError> {
        let url = normalize_target(target)?;
        let key = target_key(&url);
        let record = JobRecord::pending(url.to_string(), categories);
        let id = record.id;
        self.store.reserve(&key, url.as_str(), id)?;
        self.store.insert(record);
        info!("job {} queued for {}", id, url);
        Ok((id, url, key))
    }

    async fn run(&self, id: Uuid, url: Url, key: String) {
        let categories = match self.store.get(id) {
            Some(record) => record.categories,
            None => {
                self.store.release(&key);
                return;
            }
        };
        self.store.mark_running(id);
        let started = std::time::Instant::now();
        let outcome = self.engine.analyze(&url, &categories).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let notification = match outcome {
            Ok(analysis) => {
                let summary = format!(
                    "analysis completed: {} ({})",
                    analysis.overall_score, analysis.overall_grade
                );
                self.store.mark_completed(id, analysis, duration_ms);
                info!("job {} completed in {}ms", id, duration_ms);
                Notification {
                    kind: NotificationKind::AnalysisCompleted,
                    target: url.to_string(),
                    subject_id: id.to_string(),
                    summary,
                    at: Utc::now(),
                }
            }
            Err(err) => {
                let message = err.to_string();
                self.store.mark_failed(id, message.clone(), duration_ms);
                error!("job {} failed: {}", id, message);
                Notification {
                    kind: NotificationKind::AnalysisFailed,
                    target: url.to_string(),
                    subject_id: id.to_string(),
                    summary: message,
                    at: Utc::now(),
                }
            }
        };
        // the record is terminal, so the target may be resubmitted;
        // release before notifying so a slow notification sink does
        // not hold the slot
        self.store.release(&key);
        self.notifier.notify(notification).await;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records every notification it receives
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub events: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: Notification) {
            self.events.lock().unwrap().push(notification);
        }
    }
}
