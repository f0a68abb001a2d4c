// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("briefing_runs_total", "Briefing runs started, by trigger.");
        describe_counter!("briefing_failures_total", "Briefing runs that ended in Error.");
        describe_counter!("briefing_emails_total", "Email dispatch attempts, by outcome.");
        describe_counter!("schedule_triggers_total", "Automatic runs fired by the schedule.");
        describe_counter!(
            "schedule_skipped_total",
            "Trigger-window ticks skipped because a run was in flight."
        );
        describe_histogram!("briefing_fetch_ms", "Grounded completion latency in milliseconds.");
        describe_gauge!(
            "briefing_last_success_ts",
            "Unix ts of the last completed briefing."
        );
    });
}

impl Metrics {
    /// Install the Prometheus recorder for this process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
