//! 入站聊天请求

use serde::Deserialize;

/// `POST /api/chat` 的请求体
///
/// `message` 以宽松的 `Value` 接收，缺失、非字符串、空白都在
/// `message_text` 里统一判定为校验失败，避免 serde 反序列化
/// 直接拒绝时返回不一致的错误体。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<serde_json::Value>,
}

impl ChatRequest {
    /// 校验并取出消息文本
    ///
    /// 返回去除首尾空白后的文本；缺失、非字符串或空白时返回 `None`。
    pub fn message_text(&self) -> Option<&str> {
        let text = self.message.as_ref()?.as_str()?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}
