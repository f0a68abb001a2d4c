// src/notify/mod.rs
//! Briefing email dispatch. A send either happens, is skipped for missing
//! configuration (`Ok(false)`), or fails in the transport (`Err`).

pub mod emailjs;
pub mod smtp;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::config::{EmailSettings, EmailTransportKind, Recipient};
use crate::types::{BriefingData, GroundingSource};

pub use emailjs::EmailJsMailer;
pub use smtp::SmtpMailer;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("email service rejected the send: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("smtp: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("building message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait BriefingMailer: Send + Sync {
    /// `Ok(true)` accepted by the transport, `Ok(false)` skipped (not configured).
    async fn send(&self, data: &BriefingData) -> Result<bool, EmailError>;
    fn transport_name(&self) -> &'static str;
}

pub type DynMailer = Arc<dyn BriefingMailer>;

/// Template variables, shared by every transport:
/// `{{to_email}} {{to_name}} {{subject}} {{date}} {{message}} {{sources}}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TemplateParams {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub date: String,
    pub message: String,
    pub sources: String,
}

impl TemplateParams {
    pub fn from_briefing(data: &BriefingData, recipient: &Recipient, today: NaiveDate) -> Self {
        let date = format_date(today);
        Self {
            to_email: recipient.email.clone(),
            to_name: recipient.name.clone(),
            subject: format!("Daily Briefing: {date}"),
            date,
            message: data.summary().to_string(),
            sources: render_sources(data.sources()),
        }
    }
}

/// Short US-style date, e.g. `3/4/2025`.
pub fn format_date(d: NaiveDate) -> String {
    d.format("%-m/%-d/%Y").to_string()
}

/// One `title: uri` line per source.
pub fn render_sources(sources: &[GroundingSource]) -> String {
    sources
        .iter()
        .map(|s| format!("{}: {}", s.title, s.uri))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_mailer(settings: &EmailSettings) -> anyhow::Result<DynMailer> {
    let mailer: DynMailer = match settings.transport {
        EmailTransportKind::EmailJs => Arc::new(EmailJsMailer::new(
            settings.emailjs.clone(),
            settings.recipient.clone(),
            settings.emailjs_endpoint.clone(),
        )?),
        EmailTransportKind::Smtp => Arc::new(SmtpMailer::new(
            settings.smtp.clone(),
            settings.recipient.clone(),
        )),
    };
    tracing::info!(target: "email", transport = mailer.transport_name(), "briefing mailer ready");
    Ok(mailer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn params_carry_summary_sources_and_dated_subject() {
        let data = BriefingData::new(
            Utc.with_ymd_and_hms(2025, 3, 4, 8, 0, 0).unwrap(),
            "## Financials\n- Welspun up 4%",
            vec![
                GroundingSource::new("Welspun", "https://w.example"),
                GroundingSource::new("Cotton", "https://c.example"),
            ],
        );
        let rcpt = Recipient {
            email: "desk@example.com".into(),
            name: "Desk".into(),
        };
        let p = TemplateParams::from_briefing(&data, &rcpt, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());

        assert_eq!(p.to_email, "desk@example.com");
        assert_eq!(p.to_name, "Desk");
        assert_eq!(p.date, "3/4/2025");
        assert_eq!(p.subject, "Daily Briefing: 3/4/2025");
        assert_eq!(p.message, "## Financials\n- Welspun up 4%");
        assert_eq!(p.sources, "Welspun: https://w.example\nCotton: https://c.example");
    }

    #[test]
    fn no_sources_renders_empty_string() {
        assert_eq!(render_sources(&[]), "");
    }
}
