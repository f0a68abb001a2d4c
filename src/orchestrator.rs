// src/orchestrator.rs
//! Briefing orchestrator: owns the run state, drives the fetcher, and on
//! automatic runs hands the result to the mailer.
//!
//! All state lives in one [`BriefingState`] behind a lock, and only changes
//! through its named transitions. Every run gets a generation number; a run
//! whose generation is no longer current cannot write state, so overlapping
//! runs resolve according to [`OverlapPolicy`] instead of racing.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use metrics::{counter, gauge};
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::{OverlapPolicy, RunSettings};
use crate::fetcher::DynFetcher;
use crate::notify::DynMailer;
use crate::types::{BriefingData, Notification, RunStatus, Trigger};

pub const SENDING_MSG: &str = "Auto-sending report via secure cloud...";
pub const EMAIL_SKIPPED_MSG: &str = "Auto-email skipped (Missing configuration).";
pub const EMAIL_FAILED_MSG: &str = "Failed to auto-send email.";
pub const FALLBACK_ERROR_MSG: &str = "An unexpected error occurred.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RunRejected {
    #[error("a briefing run is already in progress")]
    AlreadyRunning,
}

/// Result of the email leg of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailOutcome {
    Sent,
    Skipped,
    Failed,
}

impl EmailOutcome {
    fn as_str(self) -> &'static str {
        match self {
            EmailOutcome::Sent => "sent",
            EmailOutcome::Skipped => "skipped",
            EmailOutcome::Failed => "failed",
        }
    }

    fn notification(self, recipient_name: &str) -> Notification {
        match self {
            EmailOutcome::Sent => Notification::success(format!(
                "Report successfully auto-emailed to {recipient_name}."
            )),
            EmailOutcome::Skipped => Notification::error(EMAIL_SKIPPED_MSG),
            EmailOutcome::Failed => Notification::error(EMAIL_FAILED_MSG),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// `email` is `None` for manual runs.
    Completed { email: Option<EmailOutcome> },
    Failed { message: String },
    /// A newer run replaced this one; its result was dropped.
    Superseded,
}

/// Proof that a run was admitted; pass it to [`Orchestrator::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTicket {
    generation: u64,
    trigger: Trigger,
}

impl RunTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Idle,
    InFlight { started: Instant, trigger: Trigger },
    Completed { trigger: Trigger },
    Failed { trigger: Trigger },
}

/// The single run-state value. Only the orchestrator writes it.
#[derive(Debug, Default)]
pub struct BriefingState {
    generation: u64,
    phase: Phase,
    briefing: Option<Arc<BriefingData>>,
    error: Option<String>,
    notification: Option<Notification>,
}

impl BriefingState {
    fn begin(
        &mut self,
        trigger: Trigger,
        now: Instant,
        policy: OverlapPolicy,
    ) -> Result<RunTicket, RunRejected> {
        if matches!(self.phase, Phase::InFlight { .. }) && policy == OverlapPolicy::Reject {
            return Err(RunRejected::AlreadyRunning);
        }
        self.generation += 1;
        self.phase = Phase::InFlight {
            started: now,
            trigger,
        };
        self.briefing = None;
        self.error = None;
        self.notification = None;
        Ok(RunTicket {
            generation: self.generation,
            trigger,
        })
    }

    fn is_current(&self, ticket: RunTicket) -> bool {
        self.generation == ticket.generation
    }

    fn complete(&mut self, ticket: RunTicket, data: Arc<BriefingData>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.phase = Phase::Completed {
            trigger: ticket.trigger,
        };
        self.briefing = Some(data);
        true
    }

    fn fail(&mut self, ticket: RunTicket, message: String) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.phase = Phase::Failed {
            trigger: ticket.trigger,
        };
        self.error = Some(message);
        true
    }

    fn notify(&mut self, generation: u64, n: Notification) -> bool {
        if self.generation != generation {
            return false;
        }
        self.notification = Some(n);
        true
    }

    /// `Summarizing` is purely a function of elapsed time.
    fn status(&self, now: Instant, summarizing_after: Duration) -> RunStatus {
        match self.phase {
            Phase::Idle => RunStatus::Idle,
            Phase::InFlight { started, .. } => {
                if now.saturating_duration_since(started) >= summarizing_after {
                    RunStatus::Summarizing
                } else {
                    RunStatus::Fetching
                }
            }
            Phase::Completed { .. } => RunStatus::Completed,
            Phase::Failed { .. } => RunStatus::Error,
        }
    }

    fn trigger(&self) -> Option<Trigger> {
        match self.phase {
            Phase::Idle => None,
            Phase::InFlight { trigger, .. }
            | Phase::Completed { trigger }
            | Phase::Failed { trigger } => Some(trigger),
        }
    }
}

/// Read-only view handed to the presentation surface.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub status: RunStatus,
    pub trigger: Option<Trigger>,
    pub generation: u64,
    pub briefing: Option<Arc<BriefingData>>,
    pub error: Option<String>,
    pub notification: Option<Notification>,
}

pub struct Orchestrator {
    fetcher: DynFetcher,
    mailer: DynMailer,
    recipient_name: String,
    settings: RunSettings,
    state: RwLock<BriefingState>,
}

impl Orchestrator {
    pub fn new(
        fetcher: DynFetcher,
        mailer: DynMailer,
        recipient_name: impl Into<String>,
        settings: RunSettings,
    ) -> Self {
        Self {
            fetcher,
            mailer,
            recipient_name: recipient_name.into(),
            settings,
            state: RwLock::new(BriefingState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BriefingState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BriefingState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> RunStatus {
        self.read()
            .status(Instant::now(), self.settings.summarizing_after())
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let s = self.read();
        StatusSnapshot {
            status: s.status(Instant::now(), self.settings.summarizing_after()),
            trigger: s.trigger(),
            generation: s.generation,
            briefing: s.briefing.clone(),
            error: s.error.clone(),
            notification: s.notification.clone(),
        }
    }

    pub fn current_briefing(&self) -> Option<Arc<BriefingData>> {
        self.read().briefing.clone()
    }

    /// Admit a run: reset result/error/notification and enter Fetching.
    pub fn begin_run(&self, trigger: Trigger) -> Result<RunTicket, RunRejected> {
        let ticket = self
            .write()
            .begin(trigger, Instant::now(), self.settings.overlap)?;
        counter!("briefing_runs_total", "trigger" => trigger.as_str()).increment(1);
        tracing::info!(
            target: "briefing",
            generation = ticket.generation,
            trigger = trigger.as_str(),
            provider = self.fetcher.provider_name(),
            "briefing run started"
        );
        Ok(ticket)
    }

    /// Drive an admitted run to its end. Never fails: fetcher and mailer
    /// errors become state and notifications.
    pub async fn execute(&self, ticket: RunTicket) -> RunOutcome {
        let data = match self.fetcher.fetch().await {
            Ok(data) => Arc::new(data),
            Err(e) => {
                let mut message = e.to_string();
                if message.trim().is_empty() {
                    message = FALLBACK_ERROR_MSG.to_string();
                }
                counter!("briefing_failures_total").increment(1);
                if !self.write().fail(ticket, message.clone()) {
                    return self.superseded(ticket);
                }
                tracing::warn!(target: "briefing", generation = ticket.generation, error = %message, "briefing run failed");
                return RunOutcome::Failed { message };
            }
        };

        if !self.write().complete(ticket, Arc::clone(&data)) {
            return self.superseded(ticket);
        }
        gauge!("briefing_last_success_ts").set(Utc::now().timestamp() as f64);
        tracing::info!(
            target: "briefing",
            generation = ticket.generation,
            sources = data.sources().len(),
            "briefing run completed"
        );

        if !ticket.trigger.is_automatic() {
            return RunOutcome::Completed { email: None };
        }

        self.write()
            .notify(ticket.generation, Notification::success(SENDING_MSG));
        let outcome = self.dispatch(&data).await;
        self.write().notify(
            ticket.generation,
            outcome.notification(&self.recipient_name),
        );
        RunOutcome::Completed {
            email: Some(outcome),
        }
    }

    /// `begin_run` + `execute`.
    pub async fn run_briefing(&self, trigger: Trigger) -> Result<RunOutcome, RunRejected> {
        let ticket = self.begin_run(trigger)?;
        Ok(self.execute(ticket).await)
    }

    /// Email the briefing currently on display. `None` when there is none.
    /// Does not touch the run status.
    pub async fn email_current(&self) -> Option<EmailOutcome> {
        let (generation, data) = {
            let s = self.read();
            (s.generation, s.briefing.clone()?)
        };
        let outcome = self.dispatch(&data).await;
        self.write()
            .notify(generation, outcome.notification(&self.recipient_name));
        Some(outcome)
    }

    async fn dispatch(&self, data: &BriefingData) -> EmailOutcome {
        let outcome = match self.mailer.send(data).await {
            Ok(true) => EmailOutcome::Sent,
            Ok(false) => EmailOutcome::Skipped,
            Err(e) => {
                tracing::error!(target: "email", transport = self.mailer.transport_name(), error = %e, "briefing email failed");
                EmailOutcome::Failed
            }
        };
        counter!("briefing_emails_total", "outcome" => outcome.as_str()).increment(1);
        tracing::info!(target: "email", transport = self.mailer.transport_name(), outcome = outcome.as_str(), "briefing email dispatched");
        outcome
    }

    fn superseded(&self, ticket: RunTicket) -> RunOutcome {
        tracing::info!(target: "briefing", generation = ticket.generation, "run superseded by a newer run; result dropped");
        RunOutcome::Superseded
    }
}
