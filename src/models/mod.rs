//! 数据模型
//!
//! - `chat`: 入站 HTTP 请求体
//! - `openai`: OpenAI 兼容接口的请求与流式响应负载

pub mod chat;
pub mod openai;

pub use chat::ChatRequest;
pub use openai::{ChatCompletionChunk, ChatCompletionRequest, ChatMessage};
