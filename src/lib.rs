//! tutorcast - AI 辅导流式转发服务
//!
//! 接收前端的单条聊天消息，转发到 OpenAI 兼容的流式补全接口，
//! 并把上游增量生成的回答以纯文本流实时回传给调用方。

pub mod config;
pub mod models;
pub mod providers;
pub mod server;
pub mod streaming;
pub mod telemetry;

pub use config::Config;
