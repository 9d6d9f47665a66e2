//! 兼容 OpenAI 接口的 Oracle 客户端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 适用于兼容 OpenAI API 的网关（Gemini、Doubao、各类代理等）
//!
//! PDF 以 `file` 内容块发送（`file_data` 为 `data:application/pdf;base64,...`），
//! 与提示词文本一起放进同一条用户消息。

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartFile,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, FileObject,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::clients::{OracleRequest, VerificationOracle};
use crate::config::Config;
use crate::error::OracleError;

const PROVIDER: &str = "openai";

/// OpenAI 兼容客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_tokens: u32,
}

impl LlmClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.oracle_api_key)
            .with_api_base(config.oracle_base_url());

        Self {
            client: Client::with_config(openai_config),
            model_name: config.oracle_model_name.clone(),
            max_tokens: config.oracle_max_tokens,
        }
    }

    /// 构建请求：文档在前，提示词在后
    fn build_request(
        &self,
        request: &OracleRequest,
    ) -> Result<CreateChatCompletionRequest, OracleError> {
        // FileObject 的字段不公开，只能通过反序列化构造
        let file: FileObject = serde_json::from_value(json!({
            "file_data": request.document_data_url(),
            "filename": request.document_name,
        }))
        .map_err(invalid_request)?;

        let content_parts = vec![
            ChatCompletionRequestUserMessageContentPart::File(
                ChatCompletionRequestMessageContentPartFile { file },
            ),
            ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: request.prompt_text.clone(),
                },
            ),
        ];

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
            .build()
            .map_err(invalid_request)?;

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .max_tokens(self.max_tokens)
            .build()
            .map_err(invalid_request)
    }
}

#[async_trait]
impl VerificationOracle for LlmClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    async fn verify(&self, request: &OracleRequest) -> Result<String, OracleError> {
        debug!(
            "调用 LLM API，模型: {}，文档 {} 字节",
            self.model_name,
            request.document.len()
        );

        let chat_request = self.build_request(request)?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            classify_openai_error(e)
        })?;

        debug!("LLM API 调用成功");

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| OracleError::EmptyResponse {
                provider: PROVIDER.to_string(),
            })
    }
}

fn invalid_request(err: impl std::fmt::Display) -> OracleError {
    OracleError::InvalidRequest {
        provider: PROVIDER.to_string(),
        message: err.to_string(),
    }
}

/// 按 async-openai 的错误类型归类
fn classify_openai_error(err: OpenAIError) -> OracleError {
    match err {
        OpenAIError::Reqwest(e) => match e.status() {
            Some(status) => OracleError::from_status(PROVIDER, status.as_u16(), None, e.to_string()),
            None => OracleError::request_failed(PROVIDER, e),
        },
        OpenAIError::ApiError(api) => classify_api_error(api),
        OpenAIError::JSONDeserialize(e, _) => OracleError::MalformedResponse {
            provider: PROVIDER.to_string(),
            message: e.to_string(),
        },
        OpenAIError::InvalidArgument(message) => invalid_request(message),
        other => OracleError::request_failed(PROVIDER, other),
    }
}

/// 错误响应体里的 `type` / `code`
///
/// async-openai 不保留 HTTP 状态码；服务端 5xx 的响应体不是 JSON，
/// 此时 `type` 和 `code` 都为空。
fn classify_api_error(api: ApiError) -> OracleError {
    let kind = api.r#type.as_deref().unwrap_or_default();
    let code = api.code.as_deref().unwrap_or_default();
    let status = match (kind, code) {
        (_, "insufficient_quota") | ("insufficient_quota", _) => {
            // 额度耗尽，不可重试
            return OracleError::BadResponse {
                provider: PROVIDER.to_string(),
                status: 429,
                message: api.message,
            };
        }
        (_, "rate_limit_exceeded") | ("rate_limit_exceeded" | "requests" | "tokens", _) => 429,
        (_, "invalid_api_key") | ("authentication_error" | "invalid_authentication", _) => 401,
        ("permission_error", _) => 403,
        ("overloaded_error", _) => 529,
        ("", "") => 500,
        _ => 400,
    };
    OracleError::from_status(PROVIDER, status, None, api.to_string())
}
