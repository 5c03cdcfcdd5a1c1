//! Gemini backend against an in-process HTTP server
//!
//! Each test starts an axum router on an ephemeral local port that plays the
//! part of the `generateContent` API.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use detective_core::config::ServiceSettings;
use detective_core::{
    AnalysisClient, AnalysisError, AnalysisRequest, CapturedImage, Emotion, GeminiBackend,
    InferenceBackend,
};

/// What the fake service saw
#[derive(Clone, Default)]
struct Seen {
    call: Option<String>,
    api_key: Option<String>,
    body: Option<Value>,
}

type Shared = Arc<Mutex<Seen>>;

fn happy_text() -> String {
    json!({
        "emotion": "Happy",
        "koreanLabel": "행복해요",
        "emoji": "😊",
        "description": "활짝 웃는 얼굴이 정말 멋져요!",
        "reasoning": ["입꼬리가 올라갔어요"],
    })
    .to_string()
}

fn record(seen: &Shared, call: String, headers: &HeaderMap, body: Value) {
    let mut seen = seen.lock();
    seen.call = Some(call);
    seen.api_key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.body = Some(body);
}

/// Serve `router` on 127.0.0.1 and return its API root
async fn serve(router: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v1beta")
}

/// Router answering every generate call with `reply`
fn service(seen: Shared, status: StatusCode, reply: String) -> Router {
    Router::new()
        .route("/v1beta/models", get(|| async { Json(json!({ "models": [] })) }))
        .route(
            "/v1beta/models/:call",
            post(
                move |State(seen): State<Shared>,
                      Path(call): Path<String>,
                      headers: HeaderMap,
                      Json(body): Json<Value>| {
                    let reply = reply.clone();
                    async move {
                        record(&seen, call, &headers, body);
                        (status, [("content-type", "application/json")], reply).into_response()
                    }
                },
            ),
        )
        .with_state(seen)
}

fn envelope(parts: Value) -> String {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": parts },
            "finishReason": "STOP"
        }],
        "modelVersion": "gemini-2.5-flash"
    })
    .to_string()
}

fn backend(base_url: String, timeout: Duration) -> GeminiBackend {
    let settings = ServiceSettings {
        base_url,
        api_key: Some("test-key".to_string()),
        request_timeout_ms: u64::try_from(timeout.as_millis()).unwrap(),
        ..Default::default()
    };
    GeminiBackend::from_settings(&settings).unwrap()
}

fn image() -> CapturedImage {
    CapturedImage::from_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0], 2, 2)
}

#[tokio::test]
async fn test_generate_sends_inline_image_and_schema() {
    let seen = Shared::default();
    let text = happy_text();
    let (first, second) = text.split_at(text.find("\"koreanLabel\"").unwrap());
    let reply = envelope(json!([{ "text": first }, { "text": second }]));
    let base = serve(service(seen.clone(), StatusCode::OK, reply)).await;

    let backend = backend(base, Duration::from_secs(5));
    let client = AnalysisClient::new(backend, "gemini-2.5-flash");
    let result = client.analyze(&image()).await.unwrap();

    assert_eq!(result.emotion, Emotion::Happy);
    assert_eq!(result.korean_label, "행복해요");
    assert_eq!(result.confidence, None);

    let seen = seen.lock().clone();
    assert_eq!(seen.call.as_deref(), Some("gemini-2.5-flash:generateContent"));
    assert_eq!(seen.api_key.as_deref(), Some("test-key"));

    let body = seen.body.unwrap();
    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[0]["inlineData"]["data"], image().payload());
    assert!(parts[1]["text"].as_str().unwrap().contains("Happy"));
    assert_eq!(
        body["generationConfig"]["responseMimeType"],
        "application/json"
    );
    assert_eq!(
        body["generationConfig"]["responseSchema"]["required"],
        json!(["emotion", "koreanLabel", "emoji", "description", "reasoning"])
    );
}

#[tokio::test]
async fn test_generate_reports_model_and_finish_reason() {
    let reply = envelope(json!([{ "text": happy_text() }]));
    let base = serve(service(Shared::default(), StatusCode::OK, reply)).await;
    let backend = backend(base, Duration::from_secs(5));

    let request = AnalysisRequest::new(&image(), "gemini-2.5-flash", "look", json!({}));
    let response = backend.generate(&request).await.unwrap();

    assert_eq!(response.text, Some(happy_text()));
    assert_eq!(response.model, "gemini-2.5-flash");
    assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
    assert!(response.duration_ms.is_some());
}

#[tokio::test]
async fn test_error_status_is_service_unavailable() {
    let reply = json!({ "error": { "code": 500, "message": "internal" } }).to_string();
    let base = serve(service(Shared::default(), StatusCode::INTERNAL_SERVER_ERROR, reply)).await;
    let backend = backend(base, Duration::from_secs(5));

    let request = AnalysisRequest::new(&image(), "gemini-2.5-flash", "look", json!({}));
    let err = backend.generate(&request).await.unwrap_err();
    assert!(err.to_string().contains("500"), "unexpected error: {err}");

    let client = AnalysisClient::new(backend, "gemini-2.5-flash");
    assert!(matches!(
        client.analyze(&image()).await,
        Err(AnalysisError::ServiceUnavailable(_))
    ));
}

#[tokio::test]
async fn test_no_candidates_is_empty_response() {
    let reply = json!({ "candidates": [] }).to_string();
    let base = serve(service(Shared::default(), StatusCode::OK, reply)).await;
    let client = AnalysisClient::new(backend(base, Duration::from_secs(5)), "gemini-2.5-flash");

    assert!(matches!(
        client.analyze(&image()).await,
        Err(AnalysisError::EmptyResponse)
    ));
}

#[tokio::test]
async fn test_undecodable_envelope_is_service_unavailable() {
    let base = serve(service(Shared::default(), StatusCode::OK, "oops".to_string())).await;
    let client = AnalysisClient::new(backend(base, Duration::from_secs(5)), "gemini-2.5-flash");

    assert!(matches!(
        client.analyze(&image()).await,
        Err(AnalysisError::ServiceUnavailable(_))
    ));
}

#[tokio::test]
async fn test_schema_violation_is_malformed() {
    let text = json!({ "emotion": "Happy", "koreanLabel": "행복해요" }).to_string();
    let reply = envelope(json!([{ "text": text }]));
    let base = serve(service(Shared::default(), StatusCode::OK, reply)).await;
    let client = AnalysisClient::new(backend(base, Duration::from_secs(5)), "gemini-2.5-flash");

    assert!(matches!(
        client.analyze(&image()).await,
        Err(AnalysisError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let router = Router::new().route(
        "/v1beta/models/:call",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            "late"
        }),
    );
    let base = serve(router).await;
    let client = AnalysisClient::new(
        backend(base, Duration::from_millis(200)),
        "gemini-2.5-flash",
    );

    assert!(matches!(
        client.analyze(&image()).await,
        Err(AnalysisError::ServiceUnavailable(_))
    ));
}

#[tokio::test]
async fn test_health_check() {
    let base = serve(service(Shared::default(), StatusCode::OK, String::new())).await;
    assert!(backend(base, Duration::from_secs(5)).health_check().await);

    // Nothing listens on a port we just released
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let offline = backend(format!("http://{addr}/v1beta"), Duration::from_secs(5));
    assert!(!offline.health_check().await);
}
