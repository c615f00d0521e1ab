//! Monitor command - foreground uptime watch

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use console::style;

use crate::jobs::Notifier;
use crate::models::{EndpointStatus, Notification, PollInterval};
use crate::monitor::{HealthMonitor, HttpProber, MONITOR_TIMEOUT};

const ENDPOINT_ID: &str = "cli";

/// Prints transition events as they happen
struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, notification: Notification) {
        println!(
            "  {} {}",
            style("***").yellow(),
            notification.summary
        );
    }
}

/// Run the monitor command
pub async fn run(url: &str, interval: PollInterval, count: u64) -> Result<()> {
    let prober = HttpProber::new(MONITOR_TIMEOUT)?;
    let monitor = Arc::new(HealthMonitor::new(
        Arc::new(prober),
        Arc::new(ConsoleNotifier),
    ));
    let endpoint = monitor.add_endpoint(ENDPOINT_ID, url, interval)?;

    println!();
    println!(
        "Monitoring {} every {} (ctrl-c to stop)",
        style(&endpoint.url).cyan(),
        interval_label(interval)
    );

    let mut ticker = tokio::time::interval(interval.as_duration());
    let mut checks = 0u64;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let endpoint = monitor.force_check(ENDPOINT_ID).await?;
                print_check(&endpoint);
                checks += 1;
                if count > 0 && checks >= count {
                    break;
                }
            }
        }
    }

    if let Some(endpoint) = monitor.get_endpoint(ENDPOINT_ID) {
        println!();
        println!(
            "  {} checks, {} up, {} down, uptime {:.1}%",
            endpoint.total_checks,
            endpoint.successful_checks,
            endpoint.failed_checks,
            endpoint.uptime
        );
    }
    Ok(())
}

fn print_check(endpoint: &crate::models::MonitoredEndpoint) {
    let status = match endpoint.status {
        EndpointStatus::Online => style("online ").green(),
        EndpointStatus::Offline => style("offline").red(),
        EndpointStatus::Warning => style("warning").yellow(),
        EndpointStatus::Unknown => style("unknown").dim(),
    };
    let response_time = endpoint
        .response_time_ms
        .map(|ms| format!("{ms}ms"))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {}  {}  {:>7}  uptime {:.1}%",
        Local::now().format("%H:%M:%S"),
        status,
        response_time,
        endpoint.uptime
    );
}

fn interval_label(interval: PollInterval) -> &'static str {
    match interval {
        PollInterval::Minute => "1m",
        PollInterval::FiveMinutes => "5m",
        PollInterval::HalfHour => "30m",
    }
}
