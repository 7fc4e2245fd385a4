//! HTTP 服务器
//!
//! 组装路由、共享状态与中间件，并驱动监听循环。
//! 每个入站请求独立处理，会话之间没有共享可变状态。

pub mod handlers;

#[cfg(test)]
mod tests;

use axum::http::{header, HeaderValue, Method};
use axum::routing::post;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::providers::OpenAiProvider;

/// 入站请求体大小上限（64KB，单条消息足够）
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// 共享应用状态
///
/// 配置与 Provider 在启动时构建一次，之后只读共享。
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub provider: Arc<OpenAiProvider>,
}

impl AppState {
    /// 从进程配置构建状态
    pub fn new(config: Config) -> Self {
        let provider = Arc::new(OpenAiProvider::new(&config));
        Self {
            config: Arc::new(config),
            provider,
        }
    }
}

/// 组装路由
///
/// `/api/chat` 是唯一的 API 端点，其余路径回落到 `public/`
/// 下的静态文件。
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin_value(&state.config))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/chat", post(handlers::chat::chat))
        .fallback_service(ServeDir::new("public"))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

/// 解析配置的跨域来源
///
/// 配置值不是合法的 header 值时退回默认来源并告警，不让启动失败。
fn allowed_origin_value(config: &Config) -> HeaderValue {
    config
        .allowed_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| {
            tracing::warn!(
                "[SERVER] ALLOWED_ORIGIN 不是合法的来源值，退回默认: {}",
                config.allowed_origin
            );
            HeaderValue::from_static("http://localhost:3000")
        })
}

/// 绑定端口并运行服务器
pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(config);
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(
        "[SERVER] Server running on http://localhost:{}",
        state.config.port
    );

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
