// tests/common/mod.rs
// Stub fetcher/mailer shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use textile_intel::config::RunSettings;
use textile_intel::fetcher::{BriefingFetcher, FetchError, UpstreamCause};
use textile_intel::notify::{BriefingMailer, EmailError};
use textile_intel::{BriefingData, GroundingSource, Orchestrator};

pub enum FetchMode {
    Succeed,
    MissingKey,
    Upstream,
}

pub struct StubFetcher {
    pub calls: AtomicUsize,
    mode: Mutex<FetchMode>,
    /// When set, every fetch waits for one `notify_one` before answering.
    gate: Option<Arc<Notify>>,
}

impl StubFetcher {
    pub fn new(mode: FetchMode) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            mode: Mutex::new(mode),
            gate: None,
        })
    }

    pub fn gated(mode: FetchMode, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            mode: Mutex::new(mode),
            gate: Some(gate),
        })
    }

    pub fn set_mode(&self, mode: FetchMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BriefingFetcher for StubFetcher {
    async fn fetch(&self) -> Result<BriefingData, FetchError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let result = match *self.mode.lock().unwrap() {
            FetchMode::Succeed => Ok(()),
            FetchMode::MissingKey => Err(FetchError::MissingApiKey),
            FetchMode::Upstream => Err(FetchError::Upstream(UpstreamCause::Other(
                "503 from provider".into(),
            ))),
        };
        result.map(|_| {
            BriefingData::new(
                Utc::now(),
                format!("## Market Trends\n- run {n}"),
                vec![
                    GroundingSource::new("Fibre2Fashion", "https://f2f.example/a"),
                    GroundingSource::new("Just Style", "https://js.example/b"),
                ],
            )
        })
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }
}

pub enum MailMode {
    Send,
    Skip,
    Fail,
}

pub struct StubMailer {
    pub calls: AtomicUsize,
    mode: Mutex<MailMode>,
    pub last_summary: Mutex<Option<String>>,
}

impl StubMailer {
    pub fn new(mode: MailMode) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            mode: Mutex::new(mode),
            last_summary: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BriefingMailer for StubMailer {
    async fn send(&self, data: &BriefingData) -> Result<bool, EmailError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_summary.lock().unwrap() = Some(data.summary().to_string());
        match *self.mode.lock().unwrap() {
            MailMode::Send => Ok(true),
            MailMode::Skip => Ok(false),
            MailMode::Fail => Err(EmailError::Other("transport down".into())),
        }
    }

    fn transport_name(&self) -> &'static str {
        "stub"
    }
}

pub fn orchestrator(
    fetcher: &Arc<StubFetcher>,
    mailer: &Arc<StubMailer>,
    settings: RunSettings,
) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(
        fetcher.clone(),
        mailer.clone(),
        "Desk",
        settings,
    ))
}
