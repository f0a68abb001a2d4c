// src/config/secrets.rs
//! Credentials and endpoints read from the process environment (or `.env`).
//! Blank values are treated exactly like missing ones.

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_EMAILJS_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

const DEFAULT_RECIPIENT_EMAIL: &str = "briefings@example.com";
const DEFAULT_RECIPIENT_NAME: &str = "Briefing Desk";

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// `None` makes every run fail before any network call.
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
}

/// Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

impl Default for Recipient {
    fn default() -> Self {
        Self {
            email: DEFAULT_RECIPIENT_EMAIL.to_string(),
            name: DEFAULT_RECIPIENT_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmailTransportKind {
    #[default]
    EmailJs,
    Smtp,
}

/// All three ids must be present for EmailJS sends to be attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailJsCredentials {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    /// Optional server-side access token ("private key" in the EmailJS dashboard).
    pub access_token: Option<String>,
}

impl EmailJsCredentials {
    pub fn from_parts(
        service_id: Option<String>,
        template_id: Option<String>,
        public_key: Option<String>,
    ) -> Option<Self> {
        Some(Self {
            service_id: service_id?,
            template_id: template_id?,
            public_key: public_key?,
            access_token: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub user: String,
    pub pass: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub transport: EmailTransportKind,
    pub recipient: Recipient,
    pub emailjs: Option<EmailJsCredentials>,
    pub emailjs_endpoint: String,
    pub smtp: Option<SmtpSettings>,
}

/// Secrets and endpoints, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub gemini: GeminiSettings,
    pub email: EmailSettings,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let gemini = GeminiSettings {
            api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            api_base: get("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
        };

        let transport = match get("EMAIL_TRANSPORT")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            Some("smtp") => EmailTransportKind::Smtp,
            Some("emailjs") | None => EmailTransportKind::EmailJs,
            Some(other) => {
                tracing::warn!(target: "email", transport = other, "unknown EMAIL_TRANSPORT, using emailjs");
                EmailTransportKind::EmailJs
            }
        };

        let defaults = Recipient::default();
        let recipient = Recipient {
            email: get("BRIEFING_RECIPIENT_EMAIL").unwrap_or(defaults.email),
            name: get("BRIEFING_RECIPIENT_NAME").unwrap_or(defaults.name),
        };

        let emailjs = EmailJsCredentials::from_parts(
            get("EMAILJS_SERVICE_ID"),
            get("EMAILJS_TEMPLATE_ID"),
            get("EMAILJS_PUBLIC_KEY"),
        )
        .map(|creds| EmailJsCredentials {
            access_token: get("EMAILJS_PRIVATE_KEY"),
            ..creds
        });

        let smtp = match (
            get("SMTP_HOST"),
            get("SMTP_USER"),
            get("SMTP_PASS"),
            get("NOTIFY_EMAIL_FROM"),
        ) {
            (Some(host), Some(user), Some(pass), Some(from)) => Some(SmtpSettings {
                host,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        let email = EmailSettings {
            transport,
            recipient,
            emailjs,
            emailjs_endpoint: get("EMAILJS_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_EMAILJS_ENDPOINT.to_string()),
            smtp,
        };

        // Presence only; never log the values.
        tracing::info!(
            gemini_key = gemini.api_key.is_some(),
            model = %gemini.model,
            transport = ?email.transport,
            emailjs = email.emailjs.is_some(),
            smtp = email.smtp.is_some(),
            "secrets resolved"
        );

        Self { gemini, email }
    }
}
