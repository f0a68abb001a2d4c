// tests/gemini_http.rs
//
// GeminiFetcher against a local axum stub of the generateContent endpoint.
// The model name picks the stub's behavior.

use std::error::Error as _;
use std::net::SocketAddr;

use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use textile_intel::config::GeminiSettings;
use textile_intel::fetcher::{BriefingFetcher, FetchError, GeminiFetcher, UpstreamCause};

const KEY: &str = "test-key";

async fn generate(Path(rest): Path<String>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if rest.contains("quota") {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}"#,
        )
            .into_response();
    }
    if rest.contains("html") {
        return (StatusCode::OK, "<html><body>gateway</body></html>").into_response();
    }

    let keyed = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) == Some(KEY);
    let grounded = body["tools"][0].get("google_search").is_some();
    if !keyed || !grounded {
        return StatusCode::BAD_REQUEST.into_response();
    }
    Json(json!({
        "candidates": [{
            "content": { "parts": [{ "text": "## Market Trends\n- Cotton up 2%" }] },
            "groundingMetadata": { "groundingChunks": [
                { "web": { "uri": "https://f2f.example/a", "title": "Fibre2Fashion" } },
                { "web": { "uri": "https://f2f.example/a", "title": "Fibre2Fashion (updated)" } },
                { "web": { "uri": "https://js.example/b" } }
            ]}
        }]
    }))
    .into_response()
}

async fn stub_server() -> SocketAddr {
    let app = Router::new().route("/models/{*rest}", post(generate));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn fetcher(addr: SocketAddr, model: &str) -> GeminiFetcher {
    GeminiFetcher::new(&GeminiSettings {
        api_key: Some(KEY.to_string()),
        model: model.to_string(),
        api_base: format!("http://{addr}"),
    })
    .unwrap()
}

#[tokio::test]
async fn quota_error_maps_to_generic_upstream_failure() {
    let addr = stub_server().await;
    let err = fetcher(addr, "quota-model").fetch().await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to generate briefing. Please try again.");
    match &err {
        FetchError::Upstream(UpstreamCause::Status { status, body }) => {
            assert_eq!(*status, 429);
            assert!(body.contains("RESOURCE_EXHAUSTED"));
        }
        other => panic!("expected a status cause, got {other:?}"),
    }
    assert!(err.source().unwrap().to_string().contains("HTTP 429"));
}

#[tokio::test]
async fn non_json_body_maps_to_generic_upstream_failure() {
    let addr = stub_server().await;
    let err = fetcher(addr, "html-model").fetch().await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to generate briefing. Please try again.");
    assert!(
        matches!(err, FetchError::Upstream(UpstreamCause::Http(ref e)) if e.is_decode()),
        "expected a decode failure, got {err:?}"
    );
}

#[tokio::test]
async fn grounded_response_becomes_a_briefing() {
    let addr = stub_server().await;
    let b = fetcher(addr, "gemini-2.5-flash").fetch().await.unwrap();

    assert_eq!(b.summary(), "## Market Trends\n- Cotton up 2%");
    assert_eq!(b.sources().len(), 1);
    assert_eq!(b.sources()[0].title, "Fibre2Fashion (updated)");
}
