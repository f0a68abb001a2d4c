// src/notify/emailjs.rs
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde::Serialize;

use super::{BriefingMailer, EmailError, TemplateParams};
use crate::config::{EmailJsCredentials, Recipient};
use crate::types::BriefingData;

/// Transactional email through the EmailJS REST API.
pub struct EmailJsMailer {
    client: Client,
    credentials: Option<EmailJsCredentials>,
    recipient: Recipient,
    endpoint: String,
}

impl EmailJsMailer {
    pub fn new(
        credentials: Option<EmailJsCredentials>,
        recipient: Recipient,
        endpoint: String,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            credentials,
            recipient,
            endpoint,
        })
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: &'a TemplateParams,
}

#[async_trait]
impl BriefingMailer for EmailJsMailer {
    async fn send(&self, data: &BriefingData) -> Result<bool, EmailError> {
        let Some(creds) = &self.credentials else {
            tracing::warn!(target: "email", "EmailJS credentials missing; configure EMAILJS_SERVICE_ID, EMAILJS_TEMPLATE_ID and EMAILJS_PUBLIC_KEY for auto-emailing");
            return Ok(false);
        };

        let params = TemplateParams::from_briefing(data, &self.recipient, Local::now().date_naive());
        let body = SendRequest {
            service_id: &creds.service_id,
            template_id: &creds.template_id,
            user_id: &creds.public_key,
            access_token: creds.access_token.as_deref(),
            template_params: &params,
        };

        let rsp = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = rsp.status();
        if !status.is_success() {
            let text = rsp.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        tracing::info!(target: "email", to = %self.recipient.email, "briefing sent via EmailJS");
        Ok(true)
    }

    fn transport_name(&self) -> &'static str {
        "emailjs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn missing_credentials_skip_without_sending() {
        // Unroutable endpoint: reaching the network would surface as Err.
        let mailer = EmailJsMailer::new(None, Recipient::default(), "http://127.0.0.1:9/send".into())
            .unwrap();
        let data = BriefingData::new(Utc::now(), "- x", vec![]);
        assert!(!mailer.send(&data).await.unwrap());
    }

    #[test]
    fn request_body_matches_emailjs_shape() {
        let params = TemplateParams {
            to_email: "a@b.c".into(),
            to_name: "A".into(),
            subject: "Daily Briefing: 1/2/2025".into(),
            date: "1/2/2025".into(),
            message: "- m".into(),
            sources: "".into(),
        };
        let body = SendRequest {
            service_id: "svc",
            template_id: "tpl",
            user_id: "pk",
            access_token: None,
            template_params: &params,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["service_id"], "svc");
        assert_eq!(v["user_id"], "pk");
        assert!(v.get("accessToken").is_none());
        assert_eq!(v["template_params"]["subject"], "Daily Briefing: 1/2/2025");
    }
}
