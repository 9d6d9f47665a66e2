/// Anthropic Messages API 客户端
///
/// PDF 以 base64 `document` 内容块发送，提示词作为紧随其后的 `text` 内容块
use crate::clients::{OracleRequest, VerificationOracle};
use crate::config::Config;
use crate::error::OracleError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const PROVIDER: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";

/// Anthropic 客户端
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model_name: String,
    max_tokens: u32,
}

impl AnthropicClient {
    /// 创建新的 Anthropic 客户端
    pub fn new(config: &Config) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.oracle_timeout_secs))
            .build()
            .map_err(|e| OracleError::InvalidRequest {
                provider: PROVIDER.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            api_key: config.oracle_api_key.clone(),
            endpoint: messages_endpoint(config.oracle_base_url()),
            model_name: config.oracle_model_name.clone(),
            max_tokens: config.oracle_max_tokens,
        })
    }

    fn build_body<'a>(&'a self, request: &'a OracleRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model_name,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Document {
                        source: DocumentSource {
                            kind: "base64",
                            media_type: request.mime_type,
                            data: request.document_base64(),
                        },
                    },
                    ContentBlock::Text {
                        text: &request.prompt_text,
                    },
                ],
            }],
        }
    }
}

#[async_trait]
impl VerificationOracle for AnthropicClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    async fn verify(&self, request: &OracleRequest) -> Result<String, OracleError> {
        debug!(
            "调用 Anthropic API，模型: {}，文档 {} 字节，提示词 {} 字符",
            self.model_name,
            request.document.len(),
            request.prompt_text.len()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| {
                warn!("Anthropic API 调用失败: {}", e);
                OracleError::request_failed(PROVIDER, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("Anthropic API 返回错误: HTTP {} {}", status.as_u16(), message);
            return Err(OracleError::from_status(
                PROVIDER,
                status.as_u16(),
                retry_after,
                message,
            ));
        }

        let body: MessagesResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                OracleError::MalformedResponse {
                    provider: PROVIDER.to_string(),
                    message: e.to_string(),
                }
            } else {
                OracleError::request_failed(PROVIDER, e)
            }
        })?;

        debug!("Anthropic API 调用成功");

        extract_text(body).ok_or_else(|| OracleError::EmptyResponse {
            provider: PROVIDER.to_string(),
        })
    }
}

fn messages_endpoint(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{}/messages", base)
    } else {
        format!("{}/v1/messages", base)
    }
}

/// 拼接所有 text 内容块
fn extract_text(body: MessagesResponse) -> Option<String> {
    let text: Vec<String> = body
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();

    let joined = text.join("\n");
    if joined.trim().is_empty() {
        None
    } else {
        Some(joined)
    }
}

// ========== 请求 / 响应结构 ==========

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock<'a> {
    Document { source: DocumentSource },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct DocumentSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn create_test_client() -> AnthropicClient {
        let config = Config {
            oracle_api_key: "test-key".to_string(),
            ..Config::default()
        };
        AnthropicClient::new(&config).unwrap()
    }

    fn client_for(base_url: &str) -> AnthropicClient {
        let config = Config {
            oracle_api_key: "test-key".to_string(),
            oracle_api_base_url: Some(base_url.to_string()),
            oracle_timeout_secs: 5,
            ..Config::default()
        };
        AnthropicClient::new(&config).unwrap()
    }

    fn http_response(status_line: &str, headers: &[(&str, &str)], body: &str) -> String {
        let mut response = format!("HTTP/1.1 {}\r\n", status_line);
        for (name, value) in headers {
            response.push_str(&format!("{}: {}\r\n", name, value));
        }
        response.push_str(&format!(
            "Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ));
        response
    }

    /// 读完整个请求（头 + Content-Length 指定的正文），返回请求头
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return String::from_utf8_lossy(&buf).into_owned();
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    return head;
                }
            }
        }
    }

    /// 本地只应答一次的 HTTP 服务，返回地址和收到的请求头
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let head = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            head
        });
        (format!("http://{}", addr), handle)
    }

    fn sample_request() -> OracleRequest {
        OracleRequest::pdf(b"%PDF".to_vec(), "check this".to_string())
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let body = r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#;
        let (url, server) = serve_once(http_response(
            "429 Too Many Requests",
            &[("Retry-After", "7")],
            body,
        ))
        .await;

        let err = client_for(&url).verify(&sample_request()).await.unwrap_err();

        assert!(matches!(
            err,
            OracleError::RateLimited {
                retry_after: Some(7),
                ..
            }
        ));
        assert!(err.is_retryable());

        let head = server.await.unwrap();
        assert!(head.starts_with("post /v1/messages "));
        assert!(head.contains("x-api-key: test-key"));
        assert!(head.contains("anthropic-version: 2023-06-01"));
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        let (url, _server) = serve_once(http_response("401 Unauthorized", &[], body)).await;

        let err = client_for(&url).verify(&sample_request()).await.unwrap_err();

        assert!(matches!(err, OracleError::Unauthorized { status: 401, .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_overloaded_uses_envelope_message() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let (url, _server) = serve_once(http_response("529 Overloaded", &[], body)).await;

        let err = client_for(&url).verify(&sample_request()).await.unwrap_err();

        match &err {
            OracleError::BadResponse {
                status, message, ..
            } => {
                assert_eq!(*status, 529);
                assert_eq!(message, "Overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_success_returns_text() {
        let body = r#"{"content":[{"type":"text","text":"**Status:** MATCH"}]}"#;
        let (url, _server) = serve_once(http_response("200 OK", &[], body)).await;

        let text = client_for(&url).verify(&sample_request()).await.unwrap();
        assert_eq!(text, "**Status:** MATCH");
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_malformed() {
        let (url, _server) = serve_once(http_response("200 OK", &[], "<html>proxy</html>")).await;

        let err = client_for(&url).verify(&sample_request()).await.unwrap_err();
        assert!(matches!(err, OracleError::MalformedResponse { .. }));
    }

    #[test]
    fn test_endpoint_normalization() {
        assert_eq!(
            messages_endpoint("https://api.anthropic.com"),
            "https://api.anthropic.com/v1/messages"
        );
        assert_eq!(
            messages_endpoint("https://proxy.local/v1/"),
            "https://proxy.local/v1/messages"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let client = create_test_client();
        let request = OracleRequest::pdf(b"%PDF".to_vec(), "check this".to_string());

        let body = serde_json::to_value(client.build_body(&request)).unwrap();

        assert_eq!(body["model"], json!("claude-sonnet-4-20250514"));
        assert_eq!(body["max_tokens"], json!(2000));
        assert_eq!(body["messages"][0]["role"], json!("user"));
        assert_eq!(
            body["messages"][0]["content"][0],
            json!({
                "type": "document",
                "source": {"type": "base64", "media_type": "application/pdf", "data": "JVBERg=="}
            })
        );
        assert_eq!(
            body["messages"][0]["content"][1],
            json!({"type": "text", "text": "check this"})
        );
    }

    #[test]
    fn test_extract_text() {
        let body: MessagesResponse = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "**Status:** MATCH"},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "**Summary:** All fields match"}
            ]
        }))
        .unwrap();
        assert_eq!(
            extract_text(body).unwrap(),
            "**Status:** MATCH\n**Summary:** All fields match"
        );

        let empty: MessagesResponse = serde_json::from_value(json!({"content": []})).unwrap();
        assert!(extract_text(empty).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_maps_to_request_failed() {
        let config = Config {
            oracle_api_key: "test-key".to_string(),
            oracle_api_base_url: Some("http://127.0.0.1:9".to_string()),
            oracle_timeout_secs: 2,
            ..Config::default()
        };
        let client = AnthropicClient::new(&config).unwrap();
        let request = OracleRequest::pdf(b"%PDF".to_vec(), "x".to_string());

        let err = client.verify(&request).await.unwrap_err();
        assert!(matches!(err, OracleError::RequestFailed { .. }));
    }

    /// 真实调用，需要 ORACLE_API_KEY 和 ORACLE_TEST_PDF
    #[tokio::test]
    #[ignore]
    async fn test_live_verify() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env().expect("读取配置失败");
        let client = AnthropicClient::new(&config).unwrap();
        let pdf_path = std::env::var("ORACLE_TEST_PDF").expect("需要 ORACLE_TEST_PDF");
        let document = std::fs::read(pdf_path).unwrap();
        let request = OracleRequest::pdf(document, "Summarize this document in one line.".to_string());

        let response = client.verify(&request).await.unwrap();
        println!("{}", response);
        assert!(!response.is_empty());
    }
}
