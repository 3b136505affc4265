use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use ecobuild_types::WasteType;
use ecobuild_vision::{Classifier, ClassifierMode, VisionClient, VisionConfig, VisionError};

async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn live_client(base_url: String, timeout: Duration) -> VisionClient {
    VisionClient::new(VisionConfig {
        api_key: Some("sk-test".into()),
        base_url,
        timeout,
        ..VisionConfig::default()
    })
}

fn reply(text: &str) -> Value {
    json!({
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": text }],
    })
}

#[tokio::test]
async fn live_request_shape_and_sanitized_reply() {
    let app = Router::new().route(
        "/v1/messages",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            assert_eq!(headers["x-api-key"], "sk-test");
            assert_eq!(headers["anthropic-version"], "2023-06-01");
            assert_eq!(body["max_tokens"], 512);
            let source = &body["messages"][0]["content"][0]["source"];
            assert_eq!(source["media_type"], "image/png");
            assert_eq!(source["data"], "AQID");
            Json(reply(
                "```json\n{\"waste_detected\": true, \"waste_type\": \"Paper\", \"estimated_weight_lbs\": 3.4, \"confidence\": 1.4, \"description\": \"newspapers\"}\n```",
            ))
        }),
    );
    let client = live_client(spawn_stub(app).await, Duration::from_secs(5));
    assert_eq!(client.mode(), ClassifierMode::Live);

    let verdict = client.classify(&[1, 2, 3], "image/PNG").await.unwrap();
    assert!(verdict.detected);
    assert_eq!(verdict.category, WasteType::Paper);
    assert_eq!(verdict.estimated_quantity, 3.4);
    assert_eq!(verdict.confidence, 1.0);
    assert_eq!(verdict.description, "newspapers");
}

#[tokio::test]
async fn upstream_error_status_is_reported() {
    let app = Router::new().route(
        "/v1/messages",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
    );
    let client = live_client(spawn_stub(app).await, Duration::from_secs(5));
    match client.classify(b"img", "image/jpeg").await {
        Err(VisionError::Upstream { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn reply_without_text_block_is_invalid() {
    let app = Router::new().route(
        "/v1/messages",
        post(|| async { Json(json!({ "content": [{ "type": "tool_use", "id": "x" }] })) }),
    );
    let client = live_client(spawn_stub(app).await, Duration::from_secs(5));
    assert!(matches!(
        client.classify(b"img", "image/jpeg").await,
        Err(VisionError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let app = Router::new().route(
        "/v1/messages",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(reply("{}"))
        }),
    );
    let client = live_client(spawn_stub(app).await, Duration::from_millis(100));
    assert!(matches!(
        client.classify(b"img", "image/jpeg").await,
        Err(VisionError::Unreachable(_))
    ));
}

#[tokio::test]
async fn unreachable_upstream_is_reported() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let client = live_client(format!("http://{addr}"), Duration::from_secs(2));
    assert!(matches!(
        client.classify(b"img", "image/jpeg").await,
        Err(VisionError::Unreachable(_))
    ));
}
