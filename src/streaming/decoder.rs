//! 事件流解码器
//!
//! 把任意切分的字节 chunk 序列重组成逐行的协议记录，
//! 不论物理读取边界落在行内的什么位置：
//!
//! - 一次读取可能在行中间结束，残留尾部保留在缓冲区，
//!   与下一个 chunk 拼接后再切分；
//! - 一个 chunk 也可能携带多条完整记录，全部按序发出。
//!
//! 每条物理行的处理规则：
//!
//! - 去除空白后为空的行是协议保活，直接丢弃；
//! - 不带 `data: ` 前缀的行不是记录，丢弃但不算错误；
//! - 负载为 `[DONE]` 时发出终止记录，之后不再解码任何字节；
//! - 其余负载按 JSON 解析为增量负载，解析失败静默丢弃并计数
//!   （部分上游会夹杂非 JSON 的成帧内容，不能因此中断会话）。

use crate::models::openai::ChatCompletionChunk;

/// 记录前缀标记
pub const DATA_PREFIX: &str = "data: ";

/// 终止哨兵负载
pub const DONE_SENTINEL: &str = "[DONE]";

/// 一条解码后的协议记录
#[derive(Debug, Clone, PartialEq)]
pub enum SseRecord {
    /// 正常的增量负载
    Chunk(ChatCompletionChunk),
    /// 终止哨兵 `data: [DONE]`
    Done,
}

/// 事件流解码器
///
/// 持有跨 chunk 的行残留缓冲区，缓冲区归单个会话的解码循环独占，
/// 不在会话之间共享。
///
/// # 示例
///
/// ```
/// use tutorcast::streaming::{SseDecoder, SseRecord};
///
/// let mut decoder = SseDecoder::new();
/// // 一条记录被切成两个 chunk 送达
/// assert!(decoder.push_chunk(b"data: {\"choi").is_empty());
/// let records = decoder.push_chunk(b"ces\":[]}\n");
/// assert_eq!(records.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// 残留缓冲区：已收到但尚未构成完整行的字节
    buffer: Vec<u8>,
    /// 是否已见到终止哨兵
    finished: bool,
    /// 被静默丢弃的无法解析记录数
    dropped_records: u64,
}

impl SseDecoder {
    /// 创建新的解码器
    pub fn new() -> Self {
        Self::default()
    }

    /// 处理一个到达的字节 chunk，返回其中解码出的全部记录（按序）
    ///
    /// 见到终止哨兵后解码器进入终态，之后的字节（包括哨兵后已经
    /// 缓冲的内容）全部忽略。
    pub fn push_chunk(&mut self, bytes: &[u8]) -> Vec<SseRecord> {
        if self.finished || bytes.is_empty() {
            return Vec::new();
        }

        self.buffer.extend_from_slice(bytes);

        let mut records = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            // 取出一条完整的物理行（含换行符），行边界是 ASCII，
            // 多字节字符不会跨行，所以此处做 UTF-8 转换是安全的
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);

            if let Some(record) = self.decode_line(&line) {
                let done = matches!(record, SseRecord::Done);
                records.push(record);
                if done {
                    self.finished = true;
                    self.buffer.clear();
                    break;
                }
            }
        }

        records
    }

    /// 解码一条物理行
    fn decode_line(&mut self, line: &str) -> Option<SseRecord> {
        let line = line.trim();
        if line.is_empty() {
            // 协议保活
            return None;
        }

        let payload = line.strip_prefix(DATA_PREFIX)?;

        if payload == DONE_SENTINEL {
            return Some(SseRecord::Done);
        }

        match serde_json::from_str::<ChatCompletionChunk>(payload) {
            Ok(chunk) => Some(SseRecord::Chunk(chunk)),
            Err(err) => {
                self.dropped_records += 1;
                tracing::debug!(
                    "[SSE_DECODE] 丢弃无法解析的记录: {} payload={}",
                    err,
                    payload
                );
                None
            }
        }
    }

    /// 是否已见到终止哨兵
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 获取被丢弃的记录数
    pub fn dropped_records(&self) -> u64 {
        self.dropped_records
    }

    /// 获取残留缓冲区大小
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}

/// 从增量负载中提取文本增量
///
/// 取第一条 choice 的 `delta.content`；字段缺失或为空串时返回
/// `None`，空增量不产生下游写入。
pub fn extract_delta(chunk: &ChatCompletionChunk) -> Option<&str> {
    let content = chunk.choices.first()?.delta.content.as_deref()?;
    if content.is_empty() {
        None
    } else {
        Some(content)
    }
}


// ============================================================================
// 属性测试（Property-Based Testing）
// ============================================================================
