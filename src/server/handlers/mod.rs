//! API 端点处理器

pub mod chat;
