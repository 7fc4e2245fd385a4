//! 转发会话流
//!
//! 把上游响应字节流封装为下游可直接消费的文本增量流，
//! 串起解码、提取、转发三步：
//!
//! 读上游 chunk → 解码记录 → 提取增量 → 逐段产出
//!
//! 单个会话内严格顺序执行，没有内部并行，保证增量的产出顺序
//! 与上游到达顺序一致。会话之间互不共享状态，可以任意并发。

use bytes::Bytes;
use futures::Stream;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::time::{Instant, Sleep};
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::StreamConfig;
use crate::streaming::decoder::{extract_delta, SseDecoder, SseRecord};
use crate::streaming::error::StreamError;
use crate::streaming::StreamResponse;

/// 转发会话流
///
/// `Stream<Item = Result<Bytes, StreamError>>`，每个 Item 是一段
/// 非空的文本增量。流在终止哨兵、上游流耗尽或错误后结束，
/// 结束后不再轮询上游；整个流被 drop 时上游连接随之释放
/// （下游断开即取消会话）。
pub struct RelayStream {
    /// 会话 ID（仅用于日志关联）
    session_id: String,
    /// 上游字节流
    source: StreamResponse,
    /// 事件流解码器（独占残留缓冲区）
    decoder: SseDecoder,
    /// 流式配置
    config: StreamConfig,
    /// 已解码但尚未产出的增量（FIFO）
    pending: VecDeque<Bytes>,
    /// 空闲读取定时器，每收到一个 chunk 重置一次
    idle: Pin<Box<Sleep>>,
    /// 是否已结束
    finished: bool,
    /// 已产出的增量数（仅用于日志）
    fragments_sent: u64,
}

impl RelayStream {
    /// 创建新的转发会话
    pub fn new(source: StreamResponse, config: StreamConfig) -> Self {
        let session_id = Uuid::new_v4().to_string();
        let idle = Box::pin(tokio::time::sleep(config.idle_timeout_duration()));

        debug!(
            "[RELAY] 会话开始 session={} idle_timeout_ms={}",
            session_id, config.idle_timeout_ms
        );

        Self {
            session_id,
            source,
            decoder: SseDecoder::new(),
            config,
            pending: VecDeque::new(),
            idle,
            finished: false,
            fragments_sent: 0,
        }
    }

    /// 重置空闲定时器
    fn rearm_idle(&mut self) {
        let deadline = Instant::now() + self.config.idle_timeout_duration();
        self.idle.as_mut().reset(deadline);
    }

    /// 把一个上游 chunk 解码为待产出的增量
    ///
    /// 见到终止哨兵时标记会话结束；哨兵之前解出的增量仍会产出。
    fn process_bytes(&mut self, bytes: &Bytes) {
        for record in self.decoder.push_chunk(bytes) {
            match record {
                SseRecord::Done => {
                    self.finished = true;
                    break;
                }
                SseRecord::Chunk(chunk) => {
                    if let Some(delta) = extract_delta(&chunk) {
                        self.fragments_sent += 1;
                        self.pending.push_back(Bytes::from(delta.to_owned()));
                    }
                }
            }
        }
    }

    fn log_finished(&self, reason: &str) {
        debug!(
            "[RELAY] 会话结束 session={} reason={} fragments={} dropped={}",
            self.session_id,
            reason,
            self.fragments_sent,
            self.decoder.dropped_records()
        );
    }
}

impl Stream for RelayStream {
    type Item = Result<Bytes, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            // 已解码的增量先产出，保持到达顺序
            if let Some(fragment) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(fragment)));
            }

            if this.finished {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.source).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.rearm_idle();
                    this.process_bytes(&bytes);
                    if this.finished {
                        this.log_finished("done-sentinel");
                    }
                    // 回到循环顶部：产出增量，或者继续轮询上游
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    error!(
                        "[RELAY] 上游流错误 session={} status={:?} error={}",
                        this.session_id,
                        e.status_code(),
                        e
                    );
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    // 上游连接关闭也是正常的结束路径
                    this.finished = true;
                    this.log_finished("upstream-eof");
                    return Poll::Ready(None);
                }
                Poll::Pending => {
                    // 上游没有数据时检查空闲超时，挂起的上游连接
                    // 不能无限占住会话
                    if this.idle.as_mut().poll(cx).is_ready() {
                        this.finished = true;
                        error!("[RELAY] 空闲读取超时 session={}", this.session_id);
                        return Poll::Ready(Some(Err(StreamError::Timeout)));
                    }
                    return Poll::Pending;
                }
            }
        }
    }
}
