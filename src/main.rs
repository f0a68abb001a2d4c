//! Textile briefing service binary.
//! Boots the schedule monitor and the Axum HTTP surface.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use textile_intel::metrics::Metrics;
use textile_intel::{AppConfig, Service};

/// `RUST_LOG` controls verbosity (default `textile_intel=info,warn`);
/// `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("textile_intel=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::load().context("loading configuration")?;
    let metrics = Metrics::init().context("installing prometheus recorder")?;

    let service = Service::start(&config)?;
    let app = service.router().merge(metrics.router());

    let bind = config.tuning.server.bind.as_str();
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(%bind, "briefing service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("http server")?;

    service.schedule.stop();
    Ok(())
}
