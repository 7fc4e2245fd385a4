//! 统一的 Provider 错误类型
//!
//! 区分认证、限流、请求、服务器等错误类别，并提供用户可读的错误信息。
//! 本服务不做重试，分类只用于日志与带内错误标注。

use std::error::Error;
use std::fmt;

/// Provider 统一错误类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// 网络错误
    /// 包括连接超时、DNS 解析失败等
    Network(String),

    /// 认证错误
    /// 凭证无效或已过期（401/403）
    Authentication(String),

    /// 限流错误（429）
    RateLimit(String),

    /// 请求错误
    /// 4xx 错误（除认证和限流外）
    Request(String),

    /// 服务器错误
    /// 5xx 错误
    Server(String),

    /// 解析错误
    /// 响应格式不符合预期
    Parse(String),

    /// 未知错误
    Unknown(String),
}

impl ProviderError {
    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ProviderError::Network(_) => "Network",
            ProviderError::Authentication(_) => "Authentication",
            ProviderError::RateLimit(_) => "RateLimit",
            ProviderError::Request(_) => "Request",
            ProviderError::Server(_) => "Server",
            ProviderError::Parse(_) => "Parse",
            ProviderError::Unknown(_) => "Unknown",
        }
    }

    /// 从 HTTP 状态码和响应体创建错误
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let detail = format!("HTTP {} - {}", status, truncate_message(body, 200));
        match status {
            401 | 403 => ProviderError::Authentication(detail),
            429 => ProviderError::RateLimit(detail),
            400 | 404 | 405 | 422 => ProviderError::Request(detail),
            500..=599 => ProviderError::Server(detail),
            _ => ProviderError::Unknown(detail),
        }
    }

    /// 从 reqwest 错误创建
    pub fn from_reqwest_error(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Network("请求超时".to_string())
        } else if err.is_connect() {
            ProviderError::Network("无法连接到服务器".to_string())
        } else if err.is_decode() {
            ProviderError::Parse("响应解码失败".to_string())
        } else if let Some(status) = err.status() {
            ProviderError::from_http_status(status.as_u16(), &err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Network(msg) => write!(f, "网络连接失败: {}", msg),
            ProviderError::Authentication(msg) => write!(f, "认证失败: {}", msg),
            ProviderError::RateLimit(msg) => write!(f, "请求过于频繁: {}", msg),
            ProviderError::Request(msg) => write!(f, "请求失败: {}", msg),
            ProviderError::Server(msg) => write!(f, "服务器错误: {}", msg),
            ProviderError::Parse(msg) => write!(f, "数据解析失败: {}", msg),
            ProviderError::Unknown(msg) => write!(f, "未知错误: {}", msg),
        }
    }
}

impl Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::from_reqwest_error(&err)
    }
}

/// 截断消息到指定长度
fn truncate_message(msg: &str, max_len: usize) -> String {
    if msg.len() <= max_len {
        msg.to_string()
    } else {
        let mut end = max_len;
        while !msg.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &msg[..end])
    }
}
