// src/notify/smtp.rs
use async_trait::async_trait;
use chrono::Local;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{Address, AsyncTransport, Tokio1Executor};

use super::{BriefingMailer, EmailError, TemplateParams};
use crate::config::{Recipient, SmtpSettings};
use crate::types::BriefingData;

/// Plain-text briefing mail over authenticated SMTP.
pub struct SmtpMailer {
    settings: Option<SmtpSettings>,
    recipient: Recipient,
}

impl SmtpMailer {
    pub fn new(settings: Option<SmtpSettings>, recipient: Recipient) -> Self {
        Self {
            settings,
            recipient,
        }
    }

    fn build_message(&self, from: &str, params: &TemplateParams) -> Result<Message, EmailError> {
        let from: Mailbox = from.parse()?;
        let to = Mailbox::new(
            Some(params.to_name.clone()),
            params.to_email.parse::<Address>()?,
        );
        let body = if params.sources.is_empty() {
            params.message.clone()
        } else {
            format!("{}\n\nSources:\n{}\n", params.message, params.sources)
        };

        Ok(Message::builder()
            .from(from)
            .to(to)
            .subject(params.subject.clone())
            .header(header::ContentType::TEXT_PLAIN)
            .body(body)?)
    }
}

#[async_trait]
impl BriefingMailer for SmtpMailer {
    async fn send(&self, data: &BriefingData) -> Result<bool, EmailError> {
        let Some(cfg) = &self.settings else {
            tracing::warn!(target: "email", "SMTP settings missing (SMTP_HOST, SMTP_USER, SMTP_PASS, NOTIFY_EMAIL_FROM); skipping");
            return Ok(false);
        };

        let params = TemplateParams::from_briefing(data, &self.recipient, Local::now().date_naive());
        let msg = self.build_message(&cfg.from, &params)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)?
            .credentials(Credentials::new(cfg.user.clone(), cfg.pass.clone()))
            .build();
        mailer.send(msg).await?;

        tracing::info!(target: "email", to = %self.recipient.email, "briefing sent via SMTP");
        Ok(true)
    }

    fn transport_name(&self) -> &'static str {
        "smtp"
    }
}
