//! Endpoint health polling
//!
//! Each registered endpoint gets its own probe loop driven by a
//! cancellation token. An endpoint is online when the probe succeeds
//! with a status below 500; a probe-side fault (timeout, DNS, connect
//! refusal from our side) parks the endpoint in Warning without
//! counting against its uptime, since it is not a confirmed outage.
//! Notifications fire only on status transitions, never on every
//! check: entering offline from online, and entering online from
//! offline or from a warning.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use reqwest::redirect::Policy;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::SiteGradeError;
use crate::fetch::normalize_target;
use crate::jobs::Notifier;
use crate::models::{
    EndpointStatus, MonitoredEndpoint, Notification, NotificationKind, PollInterval,
};

pub const MONITOR_USER_AGENT: &str = "ComplianceScanner-Monitoring/1.0";
pub const MONITOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of one successful probe round trip
#[derive(Debug, Clone, Copy)]
pub struct ProbeResult {
    pub status: u16,
    pub response_time_ms: u64,
}

impl ProbeResult {
    /// Server-side failure threshold; 4xx still means the host is up
    pub fn online(&self) -> bool {
        self.status < 500
    }
}

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &Url) -> Result<ProbeResult, SiteGradeError>;
}

/// Production prober backed by reqwest
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self, SiteGradeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(5))
            .user_agent(MONITOR_USER_AGENT)
            .build()
            .map_err(|err| SiteGradeError::Config(format!("probe client: {err}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &Url) -> Result<ProbeResult, SiteGradeError> {
        let started = std::time::Instant::now();
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| SiteGradeError::Retrieval {
                url: url.to_string(),
                source: err,
            })?;
        Ok(ProbeResult {
            status: response.status().as_u16(),
            response_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Registry of monitored endpoints and their probe loops
pub struct HealthMonitor {
    prober: Arc<dyn Prober>,
    notifier: Arc<dyn Notifier>,
    endpoints: DashMap<String, MonitoredEndpoint>,
    loops: DashMap<String, CancellationToken>,
}

impl HealthMonitor {
    pub fn new(prober: Arc<dyn Prober>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            prober,
            notifier,
            endpoints: DashMap::new(),
            loops: DashMap::new(),
        }
    }

    /// Track an endpoint without starting a loop; checks are driven
    /// by the caller through `force_check`
    pub fn add_endpoint(
        &self,
        id: &str,
        url: &str,
        interval: PollInterval,
    ) -> Result<MonitoredEndpoint, SiteGradeError> {
        let url = normalize_target(url)?;
        let endpoint = MonitoredEndpoint::new(id.to_string(), url.to_string(), interval);
        self.stop_loop(id);
        self.endpoints.insert(id.to_string(), endpoint.clone());
        Ok(endpoint)
    }

    /// Register an endpoint and start polling it.
    ///
    /// Re-registering an existing id stops the old loop first, so an
    /// interval change never leaves two loops probing one endpoint.
    pub fn register_endpoint(
        self: &Arc<Self>,
        id: &str,
        url: &str,
        interval: PollInterval,
    ) -> Result<MonitoredEndpoint, SiteGradeError> {
        let endpoint = self.add_endpoint(id, url, interval)?;
        let url = Url::parse(&endpoint.url).map_err(|err| SiteGradeError::InvalidUrl {
            input: endpoint.url.clone(),
            source: err,
        })?;
        self.start_loop(id.to_string(), url, interval.as_duration());
        info!("monitoring {} every {:?}", endpoint.url, interval);
        Ok(endpoint)
    }

    /// Pause or resume polling without losing accumulated stats
    pub fn set_endpoint_active(self: &Arc<Self>, id: &str, active: bool) -> Result<(), SiteGradeError> {
        let url = {
            let mut endpoint = self
                .endpoints
                .get_mut(id)
                .ok_or_else(|| SiteGradeError::EndpointNotFound(id.to_string()))?;
            if endpoint.active == active {
                return Ok(());
            }
            endpoint.active = active;
            endpoint.url.clone()
        };
        if active {
            let interval = self
                .endpoints
                .get(id)
                .map(|endpoint| endpoint.interval)
                .unwrap_or_default();
            let url = Url::parse(&url).map_err(|err| SiteGradeError::InvalidUrl {
                input: url,
                source: err,
            })?;
            self.start_loop(id.to_string(), url, interval.as_duration());
        } else {
            self.stop_loop(id);
            debug!("monitoring paused for {}", id);
        }
        Ok(())
    }

    /// Run one check immediately, whether or not the loop is active
    pub async fn force_check(&self, id: &str) -> Result<MonitoredEndpoint, SiteGradeError> {
        let url = self
            .endpoints
            .get(id)
            .map(|endpoint| endpoint.url.clone())
            .ok_or_else(|| SiteGradeError::EndpointNotFound(id.to_string()))?;
        let url = Url::parse(&url).map_err(|err| SiteGradeError::InvalidUrl {
            input: url,
            source: err,
        })?;
        self.perform_check(id, &url).await;
        self.endpoints
            .get(id)
            .map(|endpoint| endpoint.clone())
            .ok_or_else(|| SiteGradeError::EndpointNotFound(id.to_string()))
    }

    pub fn remove_endpoint(&self, id: &str) -> Result<(), SiteGradeError> {
        self.stop_loop(id);
        self.endpoints
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SiteGradeError::EndpointNotFound(id.to_string()))
    }

    pub fn get_endpoint(&self, id: &str) -> Option<MonitoredEndpoint> {
        self.endpoints.get(id).map(|endpoint| endpoint.clone())
    }

    pub fn snapshot(&self) -> Vec<MonitoredEndpoint> {
        self.endpoints.iter().map(|entry| entry.clone()).collect()
    }

    /// Stop every probe loop; endpoint records stay in place
    pub fn stop_all(&self) {
        for entry in self.loops.iter() {
            entry.value().cancel();
        }
        self.loops.clear();
    }

    /// Resume polling a previously saved set of endpoints.
    ///
    /// Inactive endpoints are restored for bookkeeping but get no loop.
    pub fn restart_from_storage(
        self: &Arc<Self>,
        saved: Vec<MonitoredEndpoint>,
    ) -> Result<usize, SiteGradeError> {
        let mut started = 0;
        for endpoint in saved {
            let url = Url::parse(&endpoint.url).map_err(|err| {
                SiteGradeError::Persistence(format!(
                    "saved endpoint {} has unusable url '{}': {}",
                    endpoint.id, endpoint.url, err
                ))
            })?;
            self.stop_loop(&endpoint.id);
            let id = endpoint.id.clone();
            let active = endpoint.active;
            let interval = endpoint.interval.as_duration();
            self.endpoints.insert(id.clone(), endpoint);
            if active {
                self.start_loop(id, url, interval);
                started += 1;
            }
        }
        info!("restored monitoring for {} active endpoints", started);
        Ok(started)
    }

    fn start_loop(self: &Arc<Self>, id: String, url: Url, period: Duration) {
        let token = CancellationToken::new();
        if let Some(previous) = self.loops.insert(id.clone(), token.clone()) {
            previous.cancel();
        }
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // first tick fires immediately, giving a baseline status
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => monitor.perform_check(&id, &url).await,
                }
            }
            debug!("probe loop stopped for {}", id);
        });
    }

    fn stop_loop(&self, id: &str) {
        if let Some((_, token)) = self.loops.remove(id) {
            token.cancel();
        }
    }

    async fn perform_check(&self, id: &str, url: &Url) {
        let outcome = self.prober.probe(url).await;
        let now = Utc::now();

        let transition = {
            let mut endpoint = match self.endpoints.get_mut(id) {
                Some(endpoint) => endpoint,
                None => return,
            };
            // A recovery out of Warning always notifies. For the
            // offline direction a Warning interlude is transparent;
            // compare against the last confirmed state so a fault
            // during an outage does not re-announce the outage.
            let was_warning = endpoint.status == EndpointStatus::Warning;
            let previous = match endpoint.status {
                EndpointStatus::Warning => {
                    match (endpoint.last_up_time, endpoint.last_down_time) {
                        (Some(up), Some(down)) if up > down => EndpointStatus::Online,
                        (Some(_), None) => EndpointStatus::Online,
                        (None, None) => EndpointStatus::Unknown,
                        _ => EndpointStatus::Offline,
                    }
                }
                confirmed => confirmed,
            };
            endpoint.last_check = Some(now);
            match outcome {
                Ok(result) => {
                    endpoint.total_checks += 1;
                    endpoint.response_time_ms = Some(result.response_time_ms);
                    if result.online() {
                        endpoint.successful_checks += 1;
                        endpoint.status = EndpointStatus::Online;
                        endpoint.last_up_time = Some(now);
                    } else {
                        endpoint.failed_checks += 1;
                        endpoint.status = EndpointStatus::Offline;
                        endpoint.last_down_time = Some(now);
                    }
                    endpoint.uptime =
                        endpoint.successful_checks as f64 / endpoint.total_checks as f64 * 100.0;
                    match (previous, endpoint.status) {
                        (EndpointStatus::Online, EndpointStatus::Offline) => {
                            Some((NotificationKind::EndpointOffline, result.status))
                        }
                        (EndpointStatus::Offline, EndpointStatus::Online) => {
                            Some((NotificationKind::EndpointOnline, result.status))
                        }
                        (_, EndpointStatus::Online) if was_warning => {
                            Some((NotificationKind::EndpointOnline, result.status))
                        }
                        _ => None,
                    }
                }
                Err(err) => {
                    // not a confirmed outage, leave the counters alone
                    warn!("probe fault for {}: {}", url, err);
                    endpoint.status = EndpointStatus::Warning;
                    None
                }
            }
        };

        if let Some((kind, status)) = transition {
            let summary = match kind {
                NotificationKind::EndpointOffline => {
                    format!("endpoint went offline (status {status})")
                }
                _ => format!("endpoint recovered (status {status})"),
            };
            info!("{}: {}", url, summary);
            self.notifier
                .notify(Notification {
                    kind,
                    target: url.to_string(),
                    subject_id: id.to_string(),
                    summary,
                    at: now,
                })
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::test_support::RecordingNotifier;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a scripted sequence of probe outcomes
    struct ScriptedProber {
        script: Mutex<VecDeque<Result<ProbeResult, ()>>>,
    }

    impl ScriptedProber {
        fn new(script: Vec<Result<u16, ()>>) -> Self {
            Self {
                script: Mutex::new(
                    script
                        .into_iter()
                        .map(|step| {
                            step.map(|status| ProbeResult {
                                status,
                                response_time_ms: 40,
                            })
                        })
                        .collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn probe(&self, url: &Url) -> Result<ProbeResult, SiteGradeError> {
            match self.script.lock().unwrap().pop_front() {
                Some(Ok(result)) => Ok(result),
                _ => Err(SiteGradeError::EndpointNotFound(url.to_string())),
            }
        }
    }

    fn monitor_with(script: Vec<Result<u16, ()>>) -> (Arc<HealthMonitor>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = Arc::new(HealthMonitor::new(
            Arc::new(ScriptedProber::new(script)),
            notifier.clone(),
        ));
        (monitor, notifier)
    }

    fn seed(monitor: &Arc<HealthMonitor>, id: &str) {
        // no loop, so checks stay scripted through force_check
        monitor
            .add_endpoint(id, "https://example.com", PollInterval::Minute)
            .unwrap();
    }

    #[tokio::test]
    async fn status_below_500_is_online() {
        let (monitor, notifier) = monitor_with(vec![Ok(200), Ok(404)]);
        seed(&monitor, "ep");
        for _ in 0..2 {
            monitor.force_check("ep").await.unwrap();
        }
        let endpoint = monitor.get_endpoint("ep").unwrap();
        assert_eq!(endpoint.status, EndpointStatus::Online);
        assert_eq!(endpoint.successful_checks, 2);
        assert_eq!(endpoint.failed_checks, 0);
        assert!((endpoint.uptime - 100.0).abs() < f64::EPSILON);
        // no transition happened, so no notifications
        assert!(notifier.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn notifies_only_on_transition() {
        let (monitor, notifier) = monitor_with(vec![Ok(200), Ok(500), Ok(503), Ok(200)]);
        seed(&monitor, "ep");
        for _ in 0..4 {
            monitor.force_check("ep").await.unwrap();
        }
        let events = notifier.events.lock().unwrap();
        // online -> offline once, offline -> online once; the repeated
        // 5xx check stays silent
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, NotificationKind::EndpointOffline);
        assert_eq!(events[1].kind, NotificationKind::EndpointOnline);

        let endpoint = monitor.get_endpoint("ep").unwrap();
        assert_eq!(endpoint.total_checks, 4);
        assert_eq!(endpoint.successful_checks, 2);
        assert_eq!(endpoint.failed_checks, 2);
        assert!((endpoint.uptime - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn probe_fault_warns_without_counting() {
        let (monitor, notifier) = monitor_with(vec![Ok(200), Err(()), Ok(200)]);
        seed(&monitor, "ep");
        for _ in 0..3 {
            monitor.force_check("ep").await.unwrap();
        }
        let endpoint = monitor.get_endpoint("ep").unwrap();
        assert_eq!(endpoint.status, EndpointStatus::Online);
        assert_eq!(endpoint.total_checks, 2);
        assert_eq!(endpoint.failed_checks, 0);
        // recovering out of the warning announces the endpoint as back
        let events = notifier.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, NotificationKind::EndpointOnline);
    }

    #[tokio::test]
    async fn fault_during_outage_does_not_reannounce_offline() {
        let (monitor, notifier) = monitor_with(vec![Ok(200), Ok(502), Err(()), Ok(503)]);
        seed(&monitor, "ep");
        for _ in 0..4 {
            monitor.force_check("ep").await.unwrap();
        }
        // one offline notification at the 502; the fault and the
        // follow-up 503 confirm the same outage
        let events = notifier.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, NotificationKind::EndpointOffline);
    }

    #[tokio::test]
    async fn first_check_establishes_baseline_silently() {
        let (monitor, notifier) = monitor_with(vec![Ok(503)]);
        seed(&monitor, "ep");
        monitor.force_check("ep").await.unwrap();
        let endpoint = monitor.get_endpoint("ep").unwrap();
        assert_eq!(endpoint.status, EndpointStatus::Offline);
        // unknown -> offline is a baseline, not a transition
        assert!(notifier.events.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn register_starts_a_loop_that_checks_on_schedule() {
        let (monitor, _) = monitor_with(vec![Ok(200), Ok(200), Ok(200)]);
        monitor
            .register_endpoint("ep", "example.com", PollInterval::Minute)
            .unwrap();
        // first tick is immediate, then one per minute
        tokio::time::sleep(Duration::from_secs(125)).await;
        let endpoint = monitor.get_endpoint("ep").unwrap();
        assert_eq!(endpoint.total_checks, 3);
        monitor.stop_all();
    }

    #[tokio::test(start_paused = true)]
    async fn reregister_replaces_the_old_loop() {
        let (monitor, _) = monitor_with(vec![Ok(200); 10]);
        monitor
            .register_endpoint("ep", "example.com", PollInterval::Minute)
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        // stats reset on re-register, and only one loop remains
        monitor
            .register_endpoint("ep", "example.com", PollInterval::FiveMinutes)
            .unwrap();
        tokio::time::sleep(Duration::from_secs(301)).await;
        let endpoint = monitor.get_endpoint("ep").unwrap();
        assert_eq!(endpoint.interval, PollInterval::FiveMinutes);
        assert_eq!(endpoint.total_checks, 2);
        monitor.stop_all();
    }

    #[tokio::test(start_paused = true)]
    async fn deactivation_stops_checks_and_keeps_stats() {
        let (monitor, _) = monitor_with(vec![Ok(200); 10]);
        monitor
            .register_endpoint("ep", "example.com", PollInterval::Minute)
            .unwrap();
        tokio::time::sleep(Duration::from_secs(61)).await;
        let before = monitor.get_endpoint("ep").unwrap().total_checks;
        assert_eq!(before, 2);

        monitor.set_endpoint_active("ep", false).unwrap();
        tokio::time::sleep(Duration::from_secs(300)).await;
        let endpoint = monitor.get_endpoint("ep").unwrap();
        assert_eq!(endpoint.total_checks, before);
        assert!(!endpoint.active);
    }

    #[tokio::test(start_paused = true)]
    async fn corrupt_saved_endpoint_fails_restore() {
        let (monitor, _) = monitor_with(vec![Ok(200); 4]);
        let good = MonitoredEndpoint::new(
            "good".to_string(),
            "https://example.com/".to_string(),
            PollInterval::Minute,
        );
        let mut inactive = MonitoredEndpoint::new(
            "paused".to_string(),
            "https://example.org/".to_string(),
            PollInterval::Minute,
        );
        inactive.active = false;
        let started = monitor
            .restart_from_storage(vec![good, inactive])
            .unwrap();
        assert_eq!(started, 1);
        monitor.stop_all();

        let corrupt = MonitoredEndpoint::new(
            "bad".to_string(),
            "not a url".to_string(),
            PollInterval::Minute,
        );
        assert!(matches!(
            monitor.restart_from_storage(vec![corrupt]),
            Err(SiteGradeError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn unknown_endpoint_errors() {
        let (monitor, _) = monitor_with(vec![]);
        assert!(matches!(
            monitor.force_check("missing").await,
            Err(SiteGradeError::EndpointNotFound(_))
        ));
        assert!(matches!(
            monitor.set_endpoint_active("missing", false),
            Err(SiteGradeError::EndpointNotFound(_))
        ));
    }
}
