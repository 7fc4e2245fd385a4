//! 流式传输错误类型
//!
//! 所有错误都只影响单个会话；响应头提交后发生的错误一律以带内
//! 标注写入响应体收尾，不会中断进程。

use std::fmt;

/// 流式传输错误类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// 网络错误
    ///
    /// 连接中断、连接被重置等传输层故障。
    Network(String),

    /// 空闲读取超时
    ///
    /// 上游在配置的空闲窗口内没有送来任何字节。
    Timeout,

    /// 上游错误
    ///
    /// 上游在流式传输过程中返回了错误状态。
    Upstream {
        /// HTTP 状态码
        status: u16,
        /// 错误消息
        message: String,
    },

    /// 内部错误
    Internal(String),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Network(msg) => write!(f, "网络错误: {}", msg),
            StreamError::Timeout => write!(f, "上游响应空闲超时"),
            StreamError::Upstream { status, message } => {
                write!(f, "上游错误 ({}): {}", status, message)
            }
            StreamError::Internal(msg) => write!(f, "内部错误: {}", msg),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StreamError::Timeout
        } else if err.is_connect() {
            StreamError::Network(format!("连接失败: {}", err))
        } else if let Some(status) = err.status() {
            StreamError::Upstream {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            StreamError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::Network(err.to_string())
    }
}

impl StreamError {
    /// 创建网络错误
    pub fn network(msg: impl Into<String>) -> Self {
        StreamError::Network(msg.into())
    }

    /// 创建上游错误
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        StreamError::Upstream {
            status,
            message: message.into(),
        }
    }

    /// 创建内部错误
    pub fn internal(msg: impl Into<String>) -> Self {
        StreamError::Internal(msg.into())
    }

    /// 获取 HTTP 状态码（如果适用）
    pub fn status_code(&self) -> Option<u16> {
        match self {
            StreamError::Upstream { status, .. } => Some(*status),
            StreamError::Timeout => Some(504),
            StreamError::Network(_) => Some(502),
            StreamError::Internal(_) => None,
        }
    }
}
