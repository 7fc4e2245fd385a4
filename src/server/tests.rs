//! 服务器端到端测试
//!
//! 在 127.0.0.1 上同时拉起一个模拟上游和真实路由，用 reqwest
//! 驱动完整的 请求 → 转发 → 流式响应 链路。

use super::*;
use axum::body::Body;
use axum::response::Response;
use axum::routing::post;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::StreamConfig;

/// 模拟上游的行为脚本
#[derive(Clone, Copy)]
enum UpstreamScript {
    /// 返回 200 和给定的事件流正文
    Stream(&'static str),
    /// 返回给定的错误状态和正文
    Fail(u16, &'static str),
}

/// 启动模拟上游，返回 base_url
///
/// `calls` 记录收到的 chat/completions 调用次数。
async fn spawn_mock_upstream(script: UpstreamScript, calls: Arc<AtomicUsize>) -> String {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                match script {
                    UpstreamScript::Stream(body) => Response::builder()
                        .status(200)
                        .header("content-type", "text/event-stream")
                        .body(Body::from(body))
                        .unwrap(),
                    UpstreamScript::Fail(status, body) => Response::builder()
                        .status(status)
                        .body(Body::from(body))
                        .unwrap(),
                }
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// 用指向模拟上游的配置启动真实路由，返回 /api/chat 的完整 URL
async fn spawn_relay_server(upstream_base_url: String) -> String {
    let config = Config {
        api_key: "sk-test".to_string(),
        base_url: upstream_base_url,
        port: 0,
        allowed_origin: "http://localhost:3000".to_string(),
        model: "gpt-4o-mini".to_string(),
        system_prompt: "Be concise.".to_string(),
        stream: StreamConfig::default(),
    };

    let app = build_router(AppState::new(config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api/chat", addr)
}

const HELLO_TRANSCRIPT: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\
data: [DONE]\n";

#[tokio::test]
async fn test_valid_message_streams_concatenated_deltas() {
    let calls = Arc::new(AtomicUsize::new(0));
    let upstream = spawn_mock_upstream(UpstreamScript::Stream(HELLO_TRANSCRIPT), calls.clone()).await;
    let url = spawn_relay_server(upstream).await;

    let resp = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({"message": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(resp.headers().get("cache-control").unwrap(), "no-store");

    let body = resp.text().await.unwrap();
    assert_eq!(body, "Hello");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_blank_message_rejected_without_upstream_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let upstream = spawn_mock_upstream(UpstreamScript::Stream(HELLO_TRANSCRIPT), calls.clone()).await;
    let url = spawn_relay_server(upstream).await;

    let client = reqwest::Client::new();

    for body in [
        serde_json::json!({"message": "   "}),
        serde_json::json!({"message": ""}),
        serde_json::json!({}),
        serde_json::json!({"message": 42}),
    ] {
        let resp = client.post(&url).json(&body).send().await.unwrap();
        assert_eq!(resp.status(), 400, "body={}", body);
        assert_eq!(
            resp.text().await.unwrap(),
            "{\"error\":\"Message is required.\"}"
        );
    }

    // 校验失败时绝不发起上游调用
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upstream_error_reported_in_band() {
    let calls = Arc::new(AtomicUsize::new(0));
    let upstream =
        spawn_mock_upstream(UpstreamScript::Fail(500, "upstream exploded"), calls.clone()).await;
    let url = spawn_relay_server(upstream).await;

    let resp = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({"message": "hi"}))
        .send()
        .await
        .unwrap();

    // 响应头已按流式提交，状态码只能保持 200
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.starts_with("\n\n[Error] "), "body={:?}", body);
    assert!(body.contains("500"), "body={:?}", body);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_and_empty_records_tolerated() {
    const NOISY_TRANSCRIPT: &str = "\n\
: keep-alive comment\n\
data: not-json\n\
data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\
data: [DONE]\n";

    let calls = Arc::new(AtomicUsize::new(0));
    let upstream = spawn_mock_upstream(UpstreamScript::Stream(NOISY_TRANSCRIPT), calls.clone()).await;
    let url = spawn_relay_server(upstream).await;

    let resp = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({"message": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "Hello");
}

#[tokio::test]
async fn test_records_after_done_ignored() {
    const TRAILING_TRANSCRIPT: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\
data: [DONE]\n\
data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n";

    let calls = Arc::new(AtomicUsize::new(0));
    let upstream =
        spawn_mock_upstream(UpstreamScript::Stream(TRAILING_TRANSCRIPT), calls.clone()).await;
    let url = spawn_relay_server(upstream).await;

    let resp = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({"message": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_upstream_receives_two_message_conversation() {
    use axum::extract::Json as AxumJson;

    // 自定义上游：断言请求形状后返回空回答
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().route(
        "/v1/chat/completions",
        post(|AxumJson(body): AxumJson<serde_json::Value>| async move {
            assert_eq!(body["stream"], true);
            assert_eq!(body["model"], "gpt-4o-mini");
            assert_eq!(body["messages"][0]["role"], "system");
            assert_eq!(body["messages"][1]["role"], "user");
            assert_eq!(body["messages"][1]["content"], "hi");

            Response::builder()
                .status(200)
                .header("content-type", "text/event-stream")
                .body(Body::from("data: [DONE]\n"))
                .unwrap()
        }),
    );
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let url = spawn_relay_server(format!("http://{}", addr)).await;

    let resp = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({"message": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "");
}
