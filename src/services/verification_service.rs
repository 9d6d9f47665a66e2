//! 校验服务 - 业务能力层
//!
//! 只负责"校验一对文件"能力：读文件、渲染提示词、调用 Oracle。
//! 不关心批次、顺序、重试。

use std::sync::Arc;
use tracing::debug;

use crate::clients::{OracleRequest, VerificationOracle};
use crate::error::OracleError;
use crate::models::Pair;
use crate::services::prompt::PromptTemplate;

/// 校验服务
pub struct VerificationService {
    oracle: Arc<dyn VerificationOracle>,
    template: PromptTemplate,
}

impl VerificationService {
    pub fn new(oracle: Arc<dyn VerificationOracle>, template: PromptTemplate) -> Self {
        Self { oracle, template }
    }

    pub fn provider(&self) -> &str {
        self.oracle.provider()
    }

    /// 校验一对文件，返回 Oracle 的原始文本
    ///
    /// 每次调用恰好发出一次请求；读取失败也以 `OracleError` 返回。
    pub async fn verify(&self, pair: &Pair) -> Result<String, OracleError> {
        let document = pair
            .document
            .bytes()
            .await
            .map_err(|source| OracleError::InputUnreadable {
                name: pair.document_name().to_string(),
                source,
            })?;

        let reference_bytes =
            pair.reference
                .bytes()
                .await
                .map_err(|source| OracleError::InputUnreadable {
                    name: pair.reference_name().to_string(),
                    source,
                })?;
        let reference_text = decode_reference(pair.reference_name(), &reference_bytes);

        let request = OracleRequest::pdf(document, self.template.render(&reference_text))
            .with_document_name(pair.document_name());
        self.oracle.verify(&request).await
    }
}

/// 尽力解码参考数据，非法字节替换为 U+FFFD，从不失败
pub fn decode_reference(name: &str, bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if let std::borrow::Cow::Owned(_) = text {
        debug!("{} 含有非 UTF-8 字节，已替换", name);
    }
    text.into_owned()
}
