// tests/service_wiring.rs
//
// Full wiring from AppConfig: mock fetcher via BRIEFING_TEST_MODE, EmailJS
// mailer without credentials (soft skip), Prometheus exposition.

use std::env;

use axum::body::{self, Body};
use http::{Request, StatusCode};
use tower::ServiceExt;

use textile_intel::config::{Secrets, Tuning};
use textile_intel::metrics::Metrics;
use textile_intel::{AppConfig, EmailOutcome, RunOutcome, RunStatus, Service, Trigger};

fn mock_config() -> AppConfig {
    AppConfig {
        secrets: Secrets::from_lookup(|_| None),
        tuning: Tuning::default(),
    }
}

#[serial_test::serial]
#[tokio::test]
async fn automatic_mock_run_completes_and_skips_unconfigured_email() {
    env::set_var("BRIEFING_TEST_MODE", "mock");
    let metrics = Metrics::init().expect("recorder installs once per test binary");

    let service = Service::start(&mock_config()).expect("service starts");
    let out = service
        .orchestrator
        .run_briefing(Trigger::Automatic)
        .await
        .unwrap();
    assert_eq!(
        out,
        RunOutcome::Completed {
            email: Some(EmailOutcome::Skipped)
        }
    );
    assert_eq!(service.orchestrator.status(), RunStatus::Completed);

    let app = service.router().merge(metrics.router());
    let resp = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = String::from_utf8(
        body::to_bytes(resp.into_body(), 1_048_576)
            .await
            .unwrap()
            .to_vec(),
    )
    .unwrap();
    for needle in ["briefing_runs_total", "briefing_emails_total"] {
        assert!(text.contains(needle), "metrics exposition missing '{needle}'\n{text}");
    }

    let resp = app
        .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let v: serde_json::Value =
        serde_json::from_slice(&body::to_bytes(resp.into_body(), 1_048_576).await.unwrap())
            .unwrap();
    assert_eq!(v["notification"]["message"], "Auto-email skipped (Missing configuration).");

    service.schedule.stop();
    env::remove_var("BRIEFING_TEST_MODE");
}

#[serial_test::serial]
#[tokio::test]
async fn real_fetcher_without_key_fails_the_run() {
    env::remove_var("BRIEFING_TEST_MODE");
    let orch = textile_intel::build_orchestrator(&mock_config()).unwrap();

    let out = orch.run_briefing(Trigger::Manual).await.unwrap();
    assert_eq!(
        out,
        RunOutcome::Failed {
            message: "API Key is missing. Please check your environment configuration.".into()
        }
    );
    assert_eq!(orch.status(), RunStatus::Error);
}
