//! Run one briefing and print it (stdout) without starting the HTTP server.
//! `BRIEFING_AUTO=1` runs it as an automatic run, so the email leg fires too.

use anyhow::Context;
use textile_intel::notify::render_sources;
use textile_intel::{build_orchestrator, AppConfig, RunOutcome, Trigger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let config = AppConfig::load().context("loading configuration")?;
    let orchestrator = build_orchestrator(&config)?;

    let trigger = if std::env::var("BRIEFING_AUTO").is_ok_and(|v| v == "1") {
        Trigger::Automatic
    } else {
        Trigger::Manual
    };

    let outcome = orchestrator.run_briefing(trigger).await?;
    let snap = orchestrator.snapshot();

    match outcome {
        RunOutcome::Completed { email } => {
            if let Some(b) = snap.briefing {
                println!("{}\n", b.summary());
                println!("Sources:\n{}", render_sources(b.sources()));
            }
            if let Some(e) = email {
                println!("\nemail: {e:?}");
            }
            if let Some(n) = snap.notification {
                println!("{}", n.message);
            }
        }
        RunOutcome::Failed { message } => anyhow::bail!(message),
        RunOutcome::Superseded => anyhow::bail!("run superseded"),
    }
    Ok(())
}
