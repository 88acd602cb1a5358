use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
use jarvis_relay::llm::{
    BackendError, ChatCompletionsDriver, CompletionBackend, LlmSettings, Provider, Turn,
};
use serde_json::{Value, json};

/// What the stub saw on its last request.
#[derive(Debug, Default, Clone)]
struct Seen {
    auth: Option<String>,
    body: Option<Value>,
}

/// Serve `router` on an ephemeral port and return its base URL.
async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn driver(base_url: String, timeout: Duration) -> ChatCompletionsDriver {
    ChatCompletionsDriver::new(LlmSettings {
        provider: Provider::detect_from_url(&base_url),
        base_url,
        api_key: "sk-test".to_string(),
        timeout,
    })
    .unwrap()
}

#[tokio::test]
async fn test_successful_completion() {
    let seen = Arc::new(Mutex::new(Seen::default()));
    let recorder = Arc::clone(&seen);
    let router = Router::new().route(
        "/v1/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let recorder = Arc::clone(&recorder);
            async move {
                {
                    let mut seen = recorder.lock().unwrap();
                    seen.auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(ToString::to_string);
                    seen.body = Some(body);
                }
                Json(json!({
                    "id": "chatcmpl-1",
                    "choices": [{
                        "index": 0,
                        "message": { "role": "assistant", "content": "Hello there." },
                        "finish_reason": "stop"
                    }]
                }))
            }
        }),
    );
    let base = spawn_stub(router).await;

    let reply = driver(base, Duration::from_secs(5))
        .complete(
            "gpt-4o-mini",
            &[Turn::system("persona"), Turn::user("hi")],
            0.5,
        )
        .await
        .unwrap();

    assert_eq!(reply, "Hello there.");
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.auth.as_deref(), Some("Bearer sk-test"));
    let body = seen.body.unwrap();
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "hi");
    assert!((body["temperature"].as_f64().unwrap() - 0.5).abs() < 1e-6);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": { "message": "Incorrect API key provided" } })),
            )
        }),
    );
    let base = spawn_stub(router).await;

    let err = driver(base, Duration::from_secs(5))
        .complete("gpt-4o-mini", &[Turn::user("hi")], 0.5)
        .await
        .unwrap_err();

    match err {
        BackendError::Status { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Incorrect API key"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_reported() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(json!({ "choices": [] })) }),
    );
    let base = spawn_stub(router).await;

    let err = driver(base, Duration::from_secs(5))
        .complete("gpt-4o-mini", &[Turn::user("hi")], 0.5)
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Malformed(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = driver(format!("http://{addr}"), Duration::from_secs(2))
        .complete("gpt-4o-mini", &[Turn::user("hi")], 0.5)
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Transport(_)));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({ "choices": [{ "message": { "content": "late" } }] }))
        }),
    );
    let base = spawn_stub(router).await;

    let err = driver(base, Duration::from_millis(200))
        .complete("gpt-4o-mini", &[Turn::user("hi")], 0.5)
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Transport(_)));
}
