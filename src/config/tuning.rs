// src/config/tuning.rs
//! Non-secret knobs loaded from `config/briefing.toml` (or `$BRIEFING_CONFIG_PATH`).
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "BRIEFING_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/briefing.toml";

fn default_trigger_hour() -> u32 {
    8
}
fn default_poll_interval_secs() -> u64 {
    10
}
fn default_summarizing_after_ms() -> u64 {
    2_500
}
fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScheduleSettings {
    pub trigger_hour: u32,
    pub trigger_minute: u32,
    /// Hour whose first minute clears the "already ran today" guard.
    pub reset_hour: u32,
    pub poll_interval_secs: u64,
    /// Fire later the same day when the trigger minute was missed or busy.
    pub catch_up: bool,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            trigger_hour: default_trigger_hour(),
            trigger_minute: 0,
            reset_hour: 0,
            poll_interval_secs: default_poll_interval_secs(),
            catch_up: false,
        }
    }
}

impl ScheduleSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    fn sanitize(&mut self) {
        if self.trigger_hour > 23 {
            self.trigger_hour = default_trigger_hour();
        }
        if self.trigger_minute > 59 {
            self.trigger_minute = 0;
        }
        if self.reset_hour > 23 {
            self.reset_hour = 0;
        }
        // A reset inside the trigger hour would re-arm the guard and fire repeatedly.
        if self.reset_hour == self.trigger_hour {
            self.reset_hour = (self.trigger_hour + 12) % 24;
        }
        if self.poll_interval_secs == 0 || self.poll_interval_secs > 60 {
            self.poll_interval_secs = default_poll_interval_secs();
        }
    }
}

/// What to do when a run is requested while another is still in flight.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    #[default]
    Reject,
    Replace,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunSettings {
    pub summarizing_after_ms: u64,
    pub overlap: OverlapPolicy,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            summarizing_after_ms: default_summarizing_after_ms(),
            overlap: OverlapPolicy::default(),
        }
    }
}

impl RunSettings {
    pub fn summarizing_after(&self) -> Duration {
        Duration::from_millis(self.summarizing_after_ms)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Tuning {
    pub schedule: ScheduleSettings,
    pub run: RunSettings,
    pub server: ServerSettings,
}

impl Tuning {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading briefing config from {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let mut cfg: Tuning = toml::from_str(s)?;
        cfg.schedule.sanitize();
        Ok(cfg)
    }

    /// Resolve the config file:
    /// 1) $BRIEFING_CONFIG_PATH (must exist)
    /// 2) config/briefing.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
        if fallback.exists() {
            return Self::load_from_file(&fallback);
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let t = Tuning::parse("").unwrap();
        assert_eq!(t, Tuning::default());
        assert_eq!(t.schedule.trigger_hour, 8);
        assert_eq!(t.schedule.poll_interval(), Duration::from_secs(10));
        assert_eq!(t.run.summarizing_after(), Duration::from_millis(2_500));
        assert_eq!(t.run.overlap, OverlapPolicy::Reject);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let t = Tuning::parse(
            r#"
[schedule]
catch_up = true

[run]
overlap = "replace"
"#,
        )
        .unwrap();
        assert!(t.schedule.catch_up);
        assert_eq!(t.schedule.trigger_hour, 8);
        assert_eq!(t.run.overlap, OverlapPolicy::Replace);
        assert_eq!(t.run.summarizing_after_ms, 2_500);
    }

    #[test]
    fn out_of_range_schedule_is_sanitized() {
        let t = Tuning::parse(
            r#"
[schedule]
trigger_hour = 31
trigger_minute = 75
poll_interval_secs = 0
"#,
        )
        .unwrap();
        assert_eq!(t.schedule.trigger_hour, 8);
        assert_eq!(t.schedule.trigger_minute, 0);
        assert_eq!(t.schedule.poll_interval_secs, 10);
    }

    #[test]
    fn reset_hour_never_collides_with_trigger_hour() {
        let t = Tuning::parse("[schedule]\ntrigger_hour = 0\nreset_hour = 0\n").unwrap();
        assert_eq!(t.schedule.trigger_hour, 0);
        assert_eq!(t.schedule.reset_hour, 12);
    }

    #[test]
    fn unknown_overlap_policy_is_an_error() {
        assert!(Tuning::parse("[run]\noverlap = \"queue\"\n").is_err());
    }
}
