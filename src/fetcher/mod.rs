// src/fetcher/mod.rs
//! Briefing fetcher: provider abstraction + factory.

pub mod gemini;
pub mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::config::GeminiSettings;
use crate::types::{BriefingData, GroundingSource};

pub use gemini::GeminiFetcher;

/// Used when the model answers with no text at all.
pub const EMPTY_SUMMARY_PLACEHOLDER: &str = "No summary generated.";

/// Why a grounded completion could not be obtained. The cause is kept for logs;
/// callers only ever see the generic message.
#[derive(Debug, Error)]
pub enum UpstreamCause {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("API Key is missing. Please check your environment configuration.")]
    MissingApiKey,
    #[error("Failed to generate briefing. Please try again.")]
    Upstream(#[source] UpstreamCause),
}

#[async_trait]
pub trait BriefingFetcher: Send + Sync {
    async fn fetch(&self) -> Result<BriefingData, FetchError>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynFetcher = Arc<dyn BriefingFetcher>;

/// Canned briefing for local runs without an API key (`BRIEFING_TEST_MODE=mock`).
#[derive(Debug, Clone)]
pub struct MockFetcher {
    pub summary: String,
    pub sources: Vec<GroundingSource>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self {
            summary: "## Market Trends\n- Cotton futures steady (mock)\n".to_string(),
            sources: vec![GroundingSource::new(
                "Fibre2Fashion",
                "https://www.fibre2fashion.com/",
            )],
        }
    }
}

#[async_trait]
impl BriefingFetcher for MockFetcher {
    async fn fetch(&self) -> Result<BriefingData, FetchError> {
        Ok(BriefingData::new(
            Utc::now(),
            self.summary.clone(),
            self.sources.clone(),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Factory.
///
/// * `BRIEFING_TEST_MODE=mock` → deterministic [`MockFetcher`].
/// * otherwise → [`GeminiFetcher`] (which fails per run when the key is missing).
pub fn build_fetcher(settings: &GeminiSettings) -> anyhow::Result<DynFetcher> {
    if std::env::var("BRIEFING_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        tracing::warn!(target: "briefing", "BRIEFING_TEST_MODE=mock: using canned briefings");
        return Ok(Arc::new(MockFetcher::default()));
    }
    Ok(Arc::new(GeminiFetcher::new(settings)?))
}
