//! 配置类型定义

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 默认监听端口
const DEFAULT_PORT: u16 = 3000;

/// 默认上游 API 地址
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// 默认模型
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// 默认系统提示词
const DEFAULT_SYSTEM_PROMPT: &str = "You are an academic literacy tutor. Be clear and concise.";

/// 默认允许的跨域来源
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 缺少上游 API 凭证
    MissingApiKey,
    /// 端口无法解析
    InvalidPort(String),
    /// 数值配置无法解析
    InvalidNumber { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiKey => {
                write!(f, "缺少 OPENAI_API_KEY 环境变量，无法启动")
            }
            ConfigError::InvalidPort(value) => write!(f, "PORT 无法解析为端口号: {}", value),
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{} 无法解析为数值: {}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// 流式传输配置
///
/// 控制单个转发会话的行为参数。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// 空闲读取超时（毫秒）
    ///
    /// 两个上游 chunk 之间的最大等待时间，超时后会话以
    /// `StreamError::Timeout` 结束，避免挂起的上游连接占住会话。
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

fn default_idle_timeout_ms() -> u64 {
    30_000 // 30 秒
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl StreamConfig {
    /// 创建新的配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置空闲读取超时
    pub fn with_idle_timeout_ms(mut self, idle_timeout_ms: u64) -> Self {
        self.idle_timeout_ms = idle_timeout_ms;
        self
    }

    /// 获取空闲超时 Duration
    pub fn idle_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// 进程配置
///
/// 启动时构建一次，之后通过 `Arc` 注入路由状态。
#[derive(Debug, Clone)]
pub struct Config {
    /// 上游 API 凭证
    pub api_key: String,
    /// 上游 API 地址（可带或不带 /v1 后缀）
    pub base_url: String,
    /// 监听端口
    pub port: u16,
    /// 允许的跨域来源
    pub allowed_origin: String,
    /// 模型标识
    pub model: String,
    /// 系统提示词
    pub system_prompt: String,
    /// 流式传输配置
    pub stream: StreamConfig,
}

impl Config {
    /// 从环境变量构建配置
    ///
    /// 只有 `OPENAI_API_KEY` 是必填项，其余都有默认值。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值查找函数构建配置
    ///
    /// 把环境读取抽成参数，便于在测试里用内存表驱动。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let idle_timeout_ms = match lookup("STREAM_IDLE_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    key: "STREAM_IDLE_TIMEOUT_MS".to_string(),
                    value: raw,
                })?,
            None => default_idle_timeout_ms(),
        };

        Ok(Self {
            api_key,
            base_url: lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            port,
            allowed_origin: lookup("ALLOWED_ORIGIN")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            model: lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            system_prompt: lookup("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            stream: StreamConfig::new().with_idle_timeout_ms(idle_timeout_ms),
        })
    }
}
