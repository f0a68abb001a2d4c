// src/fetcher/gemini.rs
//! Grounded completion over the Generative Language REST API, with Google
//! Search grounding enabled.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::histogram;
use serde::{Deserialize, Serialize};

use super::{prompt, BriefingFetcher, FetchError, UpstreamCause, EMPTY_SUMMARY_PLACEHOLDER};
use crate::config::GeminiSettings;
use crate::types::{BriefingData, GroundingSource};

const ERROR_BODY_LIMIT: usize = 512;

pub struct GeminiFetcher {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
}

impl GeminiFetcher {
    pub fn new(settings: &GeminiSettings) -> anyhow::Result<Self> {
        // Connect timeout only: a hung generation is allowed to hang.
        let http = reqwest::Client::builder()
            .user_agent("textile-intel/0.1")
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    async fn generate(&self, api_key: &str) -> Result<GenerateContentResponse, UpstreamCause> {
        let prompt = prompt::analyst_prompt();
        let req = GenerateContentRequest::grounded(&prompt);

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            if body.len() > ERROR_BODY_LIMIT {
                let cut = (0..=ERROR_BODY_LIMIT)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(UpstreamCause::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json::<GenerateContentResponse>().await?)
    }
}

#[async_trait]
impl BriefingFetcher for GeminiFetcher {
    async fn fetch(&self) -> Result<BriefingData, FetchError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(FetchError::MissingApiKey);
        };

        let started = Instant::now();
        let resp = self.generate(api_key).await.map_err(|cause| {
            tracing::error!(target: "briefing", model = %self.model, error = %cause, "grounded completion failed");
            FetchError::Upstream(cause)
        })?;
        histogram!("briefing_fetch_ms").record(started.elapsed().as_secs_f64() * 1_000.0);

        Ok(briefing_from_response(&resp, Utc::now()))
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Wire format
// ------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

impl<'a> GenerateContentRequest<'a> {
    fn grounded(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
    /// Thought-summary parts are not answer text.
    #[serde(default)]
    pub thought: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebChunk {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated answer text of the first candidate ("" when absent).
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter(|p| p.thought != Some(true))
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Web chunks of the first candidate that carry both a title and a uri,
    /// in response order (duplicates included).
    pub fn web_sources(&self) -> Vec<GroundingSource> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| {
                m.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .filter_map(|web| {
                        let uri = web.uri.as_deref().filter(|u| !u.is_empty())?;
                        let title = web.title.as_deref().filter(|t| !t.is_empty())?;
                        Some(GroundingSource::new(title, uri))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Turn a completion response into a briefing stamped `now`.
pub fn briefing_from_response(resp: &GenerateContentResponse, now: DateTime<Utc>) -> BriefingData {
    let text = resp.text();
    let summary = if text.is_empty() {
        EMPTY_SUMMARY_PLACEHOLDER.to_string()
    } else {
        text
    };
    BriefingData::new(now, summary, resp.web_sources())
}

/// Parse a raw response body (as returned by the REST endpoint).
pub fn parse_response(body: &str, now: DateTime<Utc>) -> Result<BriefingData, serde_json::Error> {
    let resp: GenerateContentResponse = serde_json::from_str(body)?;
    Ok(briefing_from_response(&resp, now))
}
