//! 上游 Provider
//!
//! 负责向 OpenAI 兼容的补全接口发起出站请求。

mod error;
mod openai;

pub use error::ProviderError;
pub use openai::OpenAiProvider;
