//! OpenAI 兼容 Provider
//!
//! 向上游 chat/completions 接口发起流式请求，返回原始字节流。
//! 非成功状态会连同响应体一起转换为 `ProviderError`，绝不静默吞掉。

use reqwest::Client;

use crate::config::Config;
use crate::models::openai::ChatCompletionRequest;
use crate::providers::ProviderError;
use crate::streaming::{reqwest_stream_to_stream_response, StreamResponse};

/// OpenAI 兼容 Provider
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    client: Client,
}

impl OpenAiProvider {
    /// 从进程配置创建 Provider
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            client: Client::new(),
        }
    }

    /// 构建完整的 API URL
    ///
    /// 兼容用户输入的 base_url 带或不带 /v1 后缀
    fn build_url(&self, endpoint: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{}/{}", base, endpoint)
        } else {
            format!("{}/v1/{}", base, endpoint)
        }
    }

    /// 发起流式聊天补全请求
    ///
    /// 成功时返回打开的响应字节流，会话存续期间持有一条出站连接。
    /// 状态码不在成功范围时读取响应体并返回 `ProviderError`。
    pub async fn call_api_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<StreamResponse, ProviderError> {
        let url = self.build_url("chat/completions");

        tracing::info!(
            "[OPENAI_STREAM] 发起流式请求: url={} model={}",
            url,
            request.model
        );

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest_error(&e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = ProviderError::from_http_status(status.as_u16(), &body);
            tracing::error!("[OPENAI_STREAM] 请求失败: type={} {}", err.error_type(), err);
            return Err(err);
        }

        tracing::debug!("[OPENAI_STREAM] 流式响应开始: status={}", status);

        Ok(reqwest_stream_to_stream_response(resp))
    }
}
