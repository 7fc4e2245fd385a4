//! 流式传输核心模块
//!
//! 把上游事件流的原始字节增量解码为逐条记录，提取文本增量，
//! 并以逐段转发的方式回传给下游连接。
//!
//! # 主要组件
//!
//! - `error`: 流式错误类型定义
//! - `decoder`: 事件流解码器（跨 chunk 行重组）与增量提取
//! - `relay`: 单个转发会话的惰性流

pub mod decoder;
pub mod error;
pub mod relay;

use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

pub use decoder::{extract_delta, SseDecoder, SseRecord};
pub use error::StreamError;
pub use relay::RelayStream;

/// 流式响应类型别名
///
/// 一个异步字节流，每个 Item 是一个 chunk 的字节数据或错误。
/// 使用 `Pin<Box<...>>` 以支持动态分发和异步迭代。
pub type StreamResponse = Pin<Box<dyn Stream<Item = Result<Bytes, StreamError>> + Send>>;

/// 将 reqwest 的 bytes_stream 转换为 StreamResponse
pub fn reqwest_stream_to_stream_response(response: reqwest::Response) -> StreamResponse {
    use futures::StreamExt;

    let stream = response
        .bytes_stream()
        .map(|result| result.map_err(StreamError::from));

    Box::pin(stream)
}
