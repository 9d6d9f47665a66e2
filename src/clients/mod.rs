//! Oracle 客户端
//!
//! 每个客户端对应一个外部校验服务，只负责"发一次请求、拿回文本"。
//! 所有传输层错误在这里转换成 `OracleError`。

pub mod anthropic_client;
pub mod llm_client;

pub use anthropic_client::AnthropicClient;
pub use llm_client::LlmClient;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::sync::Arc;

use crate::config::{Config, OracleProvider};
use crate::error::OracleError;

/// 文档的 MIME 类型
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// 一次校验请求
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub document: Vec<u8>,
    /// 文档文件名，部分接口要求随文件内容一起发送
    pub document_name: String,
    pub mime_type: &'static str,
    pub prompt_text: String,
}

impl OracleRequest {
    pub fn pdf(document: Vec<u8>, prompt_text: String) -> Self {
        Self {
            document,
            document_name: "document.pdf".to_string(),
            mime_type: PDF_MIME_TYPE,
            prompt_text,
        }
    }

    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = name.into();
        self
    }

    /// 文档内容的 base64 编码
    pub fn document_base64(&self) -> String {
        BASE64.encode(&self.document)
    }

    /// `data:<mime>;base64,<data>` 形式的文档
    pub fn document_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.document_base64())
    }
}

/// 外部校验服务
#[async_trait]
pub trait VerificationOracle: Send + Sync {
    /// 服务名称，用于日志和错误信息
    fn provider(&self) -> &str;

    /// 发送一次请求，返回校验报告原文
    ///
    /// 不做重试；任何失败都以 `OracleError` 返回。
    async fn verify(&self, request: &OracleRequest) -> Result<String, OracleError>;
}

/// 根据配置创建 Oracle 客户端
pub fn build_oracle(config: &Config) -> Result<Arc<dyn VerificationOracle>, OracleError> {
    let oracle: Arc<dyn VerificationOracle> = match config.oracle_provider {
        OracleProvider::Anthropic => Arc::new(AnthropicClient::new(config)?),
        OracleProvider::OpenAi => Arc::new(LlmClient::new(config)),
    };
    Ok(oracle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_encoding() {
        let request = OracleRequest::pdf(b"%PDF-1.4".to_vec(), "prompt".to_string());

        assert_eq!(request.mime_type, "application/pdf");
        assert_eq!(request.document_base64(), "JVBERi0xLjQ=");
        assert_eq!(
            request.document_data_url(),
            "data:application/pdf;base64,JVBERi0xLjQ="
        );
    }

    #[test]
    fn test_build_oracle_by_provider() {
        let config = Config {
            oracle_api_key: "k".to_string(),
            ..Config::default()
        };
        assert_eq!(build_oracle(&config).unwrap().provider(), "anthropic");

        let config = Config {
            oracle_provider: OracleProvider::OpenAi,
            ..config
        };
        assert_eq!(build_oracle(&config).unwrap().provider(), "openai");
    }
}
