// src/schedule.rs
//! Wall-clock schedule monitor: fires one automatic briefing per day at the
//! configured local time, and keeps a countdown to the next firing.
//!
//! Default behavior only fires inside the trigger minute and only when the
//! orchestrator is Idle; a busy orchestrator at that minute means no automatic
//! run that day. `catch_up = true` lifts both limits for the rest of the day,
//! and counts "already ran" by calendar date instead of the reset minute.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use metrics::counter;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::ScheduleSettings;
use crate::orchestrator::Orchestrator;
use crate::types::{RunStatus, Trigger};

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    fn now_local(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_local(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Local time that starts at `base` and advances with the tokio clock.
/// Pairs with paused tokio time to simulate a day.
#[derive(Debug, Clone, Copy)]
pub struct OffsetClock {
    base: NaiveDateTime,
    origin: Instant,
}

impl OffsetClock {
    pub fn starting_at(base: NaiveDateTime) -> Self {
        Self {
            base,
            origin: Instant::now(),
        }
    }
}

impl Clock for OffsetClock {
    fn now_local(&self) -> NaiveDateTime {
        let elapsed = Instant::now().saturating_duration_since(self.origin);
        let elapsed = ChronoDuration::from_std(elapsed).unwrap_or(ChronoDuration::zero());
        self.base + elapsed
    }
}

/// "Already auto-ran today". Holds the local date of the last firing.
/// The default mode clears it during the reset minute; catch-up mode compares dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerGuard {
    fired_on: Option<NaiveDate>,
}

impl TriggerGuard {
    pub fn is_set(&self) -> bool {
        self.fired_on.is_some()
    }

    pub fn fired_on(&self) -> Option<NaiveDate> {
        self.fired_on
    }

    fn set(&mut self, day: NaiveDate) {
        self.fired_on = Some(day);
    }

    fn clear(&mut self) {
        self.fired_on = None;
    }
}

/// Time left until the next trigger, floored to whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub hours: i64,
    pub minutes: i64,
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

/// Next occurrence of `hour:minute` strictly after `now` (today if still ahead, else tomorrow).
pub fn countdown_to_next(now: NaiveDateTime, hour: u32, minute: u32) -> Countdown {
    let at = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let mut target = now.date().and_time(at);
    if now >= target {
        target += ChronoDuration::days(1);
    }
    let total = (target - now).num_minutes();
    Countdown {
        hours: total / 60,
        minutes: total % 60,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Start an automatic run now.
    pub fire: bool,
    /// In the trigger window with the guard clear, but the orchestrator was busy.
    pub skipped_busy: bool,
    pub countdown: Countdown,
}

/// The pure per-tick decision logic; the polling loop lives in
/// [`spawn_schedule_monitor`].
#[derive(Debug, Clone)]
pub struct ScheduleMonitor {
    settings: ScheduleSettings,
    guard: TriggerGuard,
}

impl ScheduleMonitor {
    pub fn new(settings: ScheduleSettings) -> Self {
        Self {
            settings,
            guard: TriggerGuard::default(),
        }
    }

    pub fn guard(&self) -> TriggerGuard {
        self.guard
    }

    pub fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    fn in_trigger_window(&self, now: NaiveDateTime) -> bool {
        let (h, m) = (self.settings.trigger_hour, self.settings.trigger_minute);
        if self.settings.catch_up {
            (now.hour(), now.minute()) >= (h, m)
        } else {
            now.hour() == h && now.minute() == m
        }
    }

    /// Catch-up mode keys on the date so a reset minute later in the day
    /// cannot re-open the window.
    fn already_fired(&self, now: NaiveDateTime) -> bool {
        if self.settings.catch_up {
            self.guard.fired_on() == Some(now.date())
        } else {
            self.guard.is_set()
        }
    }

    /// Whether the guard currently counts as "ran today" for `now`.
    pub fn ran_today(&self, now: NaiveDateTime) -> bool {
        self.already_fired(now)
    }

    fn may_fire(&self, status: RunStatus) -> bool {
        if self.settings.catch_up {
            !status.is_in_flight()
        } else {
            status == RunStatus::Idle
        }
    }

    pub fn tick(&mut self, now: NaiveDateTime, status: RunStatus) -> TickReport {
        let mut fire = false;
        let mut skipped_busy = false;

        if self.in_trigger_window(now) && !self.already_fired(now) {
            if self.may_fire(status) {
                self.guard.set(now.date());
                fire = true;
            } else {
                skipped_busy = true;
            }
        }

        // Catch-up mode rolls over with the date instead.
        if !self.settings.catch_up && now.hour() == self.settings.reset_hour && now.minute() == 0 {
            self.guard.clear();
        }

        TickReport {
            fire,
            skipped_busy,
            countdown: countdown_to_next(
                now,
                self.settings.trigger_hour,
                self.settings.trigger_minute,
            ),
        }
    }

    /// Start the run a firing tick asked for. A refused start releases the
    /// guard so a later tick in the window can try again.
    pub fn admit<T, E>(&mut self, start: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let started = start();
        if started.is_err() {
            self.guard.clear();
        }
        started
    }
}

/// What the presentation surface shows about the schedule.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleView {
    pub countdown: Option<Countdown>,
    pub ran_today: bool,
    pub last_tick: Option<NaiveDateTime>,
}

pub type SharedScheduleView = Arc<RwLock<ScheduleView>>;

/// Running monitor. Stopping (or dropping) it tears down the polling task.
pub struct ScheduleHandle {
    view: SharedScheduleView,
    task: JoinHandle<()>,
}

impl ScheduleHandle {
    pub fn view(&self) -> SharedScheduleView {
        Arc::clone(&self.view)
    }

    pub fn stop(self) {
        tracing::info!(target: "schedule", "schedule monitor stopped");
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Poll `clock` every `poll_interval_secs` and start automatic runs on `orchestrator`.
/// The first check happens immediately.
pub fn spawn_schedule_monitor(
    orchestrator: Arc<Orchestrator>,
    settings: ScheduleSettings,
    clock: Arc<dyn Clock>,
) -> ScheduleHandle {
    let view: SharedScheduleView = Arc::new(RwLock::new(ScheduleView::default()));
    let published = Arc::clone(&view);

    let task = tokio::spawn(async move {
        let mut monitor = ScheduleMonitor::new(settings);
        let mut ticker = time::interval(monitor.settings().poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            target: "schedule",
            hour = monitor.settings().trigger_hour,
            minute = monitor.settings().trigger_minute,
            catch_up = monitor.settings().catch_up,
            "schedule monitor running"
        );

        loop {
            ticker.tick().await;
            let now = clock.now_local();
            let was_set = monitor.guard().is_set();
            let report = monitor.tick(now, orchestrator.status());

            {
                let mut v = published.write().unwrap_or_else(PoisonError::into_inner);
                v.countdown = Some(report.countdown);
                v.ran_today = monitor.ran_today(now);
                v.last_tick = Some(now);
            }

            if was_set && !monitor.guard().is_set() {
                tracing::debug!(target: "schedule", "daily trigger guard reset");
            }

            if report.skipped_busy {
                counter!("schedule_skipped_total").increment(1);
                tracing::debug!(target: "schedule", %now, "trigger window reached while busy; skipping");
            }

            if report.fire {
                match monitor.admit(|| orchestrator.begin_run(Trigger::Automatic)) {
                    Ok(ticket) => {
                        counter!("schedule_triggers_total").increment(1);
                        tracing::info!(target: "schedule", %now, generation = ticket.generation(), "auto-triggering scheduled briefing");
                        let orch = Arc::clone(&orchestrator);
                        tokio::spawn(async move {
                            orch.execute(ticket).await;
                        });
                    }
                    Err(e) => {
                        counter!("schedule_skipped_total").increment(1);
                        tracing::warn!(target: "schedule", %now, error = %e, "automatic run refused; guard released");
                    }
                }
                let mut v = published.write().unwrap_or_else(PoisonError::into_inner);
                v.ran_today = monitor.ran_today(now);
            }
        }
    });

    ScheduleHandle { view, task }
}
