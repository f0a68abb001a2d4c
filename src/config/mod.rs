// src/config/mod.rs
pub mod secrets;
pub mod tuning;

pub use secrets::{
    EmailJsCredentials, EmailSettings, EmailTransportKind, GeminiSettings, Recipient, Secrets,
    SmtpSettings,
};
pub use tuning::{OverlapPolicy, RunSettings, ScheduleSettings, ServerSettings, Tuning};

/// Everything the service needs at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub secrets: Secrets,
    pub tuning: Tuning,
}

impl AppConfig {
    /// Environment secrets plus the TOML tuning file (defaults when absent).
    pub fn load() -> anyhow::Result<Self> {
        let tuning = Tuning::load_default()?;
        let secrets = Secrets::from_env();
        Ok(Self { secrets, tuning })
    }
}
