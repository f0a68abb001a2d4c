// src/lib.rs
// Public library surface for integration tests and the binaries.

pub mod api;
pub mod config;
pub mod fetcher;
pub mod metrics;
pub mod notify;
pub mod orchestrator;
pub mod schedule;
pub mod types;

use std::sync::Arc;

use axum::Router;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::AppConfig;
pub use crate::orchestrator::{EmailOutcome, Orchestrator, RunOutcome, RunRejected};
pub use crate::types::{BriefingData, GroundingSource, Notification, RunStatus, Trigger};

use crate::schedule::{spawn_schedule_monitor, ScheduleHandle, SystemClock};

/// A wired-up service: orchestrator plus its running schedule monitor.
pub struct Service {
    pub orchestrator: Arc<Orchestrator>,
    pub schedule: ScheduleHandle,
}

impl Service {
    /// Build fetcher, mailer and orchestrator from `config` and start the
    /// schedule monitor. Must be called inside a tokio runtime.
    pub fn start(config: &AppConfig) -> anyhow::Result<Self> {
        let orchestrator = Arc::new(build_orchestrator(config)?);
        let schedule = spawn_schedule_monitor(
            Arc::clone(&orchestrator),
            config.tuning.schedule.clone(),
            Arc::new(SystemClock),
        );
        Ok(Self {
            orchestrator,
            schedule,
        })
    }

    pub fn router(&self) -> Router {
        api::router(api::AppState {
            orchestrator: Arc::clone(&self.orchestrator),
            schedule: self.schedule.view(),
        })
    }
}

/// Orchestrator without a schedule (one-shot runs).
pub fn build_orchestrator(config: &AppConfig) -> anyhow::Result<Orchestrator> {
    let fetcher = fetcher::build_fetcher(&config.secrets.gemini)?;
    let mailer = notify::build_mailer(&config.secrets.email)?;
    Ok(Orchestrator::new(
        fetcher,
        mailer,
        config.secrets.email.recipient.name.clone(),
        config.tuning.run.clone(),
    ))
}
