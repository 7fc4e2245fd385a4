//! 聊天转发处理器
//!
//! 校验入站消息、调用上游 Provider，并把增量流逐段写回客户端。
//!
//! 响应头在写入任何正文字节之前提交且只提交一次；此后上游出错
//! 只能以带内的 `[Error]` 标注追加到正文末尾收尾，状态码保持 200。
//! 客户端中途断开时正文流被 drop，转发会话与上游连接随之释放。

use std::convert::Infallible;
use std::fmt;

use async_stream::stream;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures::StreamExt;

use crate::models::chat::ChatRequest;
use crate::models::openai::ChatCompletionRequest;
use crate::server::AppState;
use crate::streaming::RelayStream;

/// 校验失败时的固定错误体
const VALIDATION_ERROR_BODY: &str = r#"{"error":"Message is required."}"#;

/// `POST /api/chat`
///
/// 校验失败直接返回 400，不发起任何上游调用。
pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    let Some(message) = request.message_text().map(str::to_owned) else {
        return (
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, "application/json")],
            VALIDATION_ERROR_BODY,
        )
            .into_response();
    };

    let upstream_request =
        ChatCompletionRequest::relay(&state.config.model, &state.config.system_prompt, &message);
    let provider = state.provider.clone();
    let stream_config = state.config.stream.clone();

    // 正文流本身不可失败：所有错误都转换成带内标注，
    // 保证客户端总能收到完整收尾的响应而不是被掐断的连接
    let body_stream = stream! {
        match provider.call_api_stream(&upstream_request).await {
            Ok(source) => {
                let mut relay = RelayStream::new(source, stream_config);
                while let Some(item) = relay.next().await {
                    match item {
                        Ok(fragment) => yield Ok::<Bytes, Infallible>(fragment),
                        Err(error) => {
                            yield Ok(error_trailer(&error));
                            break;
                        }
                    }
                }
            }
            Err(error) => {
                yield Ok(error_trailer(&error));
            }
        }
    };

    match Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from_stream(body_stream))
    {
        Ok(response) => response,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// 头部提交后无法再改写状态码，错误以可见标注追加到正文末尾
fn error_trailer(error: &dyn fmt::Display) -> Bytes {
    Bytes::from(format!("\n\n[Error] {}", error))
}
