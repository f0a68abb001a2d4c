// src/types.rs
//! Value types shared by the fetcher, the mailers and the orchestrator.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One cited web page from the grounding metadata. `uri` is the identity.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

impl GroundingSource {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}

/// A finished briefing. Immutable once built; `sources` never holds two entries
/// with the same uri.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BriefingData {
    timestamp: DateTime<Utc>,
    summary: String,
    sources: Vec<GroundingSource>,
}

impl BriefingData {
    pub fn new(
        timestamp: DateTime<Utc>,
        summary: impl Into<String>,
        sources: impl IntoIterator<Item = GroundingSource>,
    ) -> Self {
        Self {
            timestamp,
            summary: summary.into(),
            sources: dedup_by_uri(sources),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Markdown: category headers with bullet points underneath.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn sources(&self) -> &[GroundingSource] {
        &self.sources
    }
}

/// Collapse sources sharing a uri. The last entry seen for a uri wins; the
/// slot is the one where that uri first appeared.
pub fn dedup_by_uri(sources: impl IntoIterator<Item = GroundingSource>) -> Vec<GroundingSource> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<GroundingSource> = Vec::new();
    for src in sources {
        match slots.get(&src.uri) {
            Some(&idx) => out[idx] = src,
            None => {
                slots.insert(src.uri.clone(), out.len());
                out.push(src);
            }
        }
    }
    out
}

/// Process-wide run status as seen by the presentation surface.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    #[default]
    Idle,
    Fetching,
    /// Cosmetic: derived from elapsed time, never branched on.
    Summarizing,
    Completed,
    Error,
}

impl RunStatus {
    pub fn is_in_flight(self) -> bool {
        matches!(self, RunStatus::Fetching | RunStatus::Summarizing)
    }
}

/// What started a run. Only automatic runs dispatch email.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Manual,
    Automatic,
}

impl Trigger {
    pub fn is_automatic(self) -> bool {
        matches!(self, Trigger::Automatic)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Manual => "manual",
            Trigger::Automatic => "automatic",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Toast-style message. Each new one replaces the previous; no history.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Error,
        }
    }
}
