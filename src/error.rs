//! 错误类型
//!
//! 按来源划分：配对、Oracle 调用、文件、配置。
//! 只有 `MatchError` 和启动期的 `ConfigError` / `FileError` 会终止一次运行，
//! `OracleError` 在批处理层被吸收为单条 `Error` 结果。

use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配对错误
    #[error("配对错误: {0}")]
    Match(#[from] MatchError),
    /// Oracle 调用错误
    #[error("Oracle错误: {0}")]
    Oracle(#[from] OracleError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 校验开始前收到中断
    #[error("运行已取消，未开始校验，报告未写入")]
    Cancelled,
}

/// 配对阶段的终止性错误
#[derive(Debug, Error)]
pub enum MatchError {
    /// 两组文件之间没有任何配对
    #[error("没有找到任何配对，请确认 PDF 与 CSV 文件名一致 (例如 claim_001.pdf ↔ claim_001.csv)")]
    NoMatches,

    /// 存在未配对文件且调用方没有确认继续
    #[error("存在未配对文件 (PDF: {documents}, CSV: {references})，未确认继续")]
    UnmatchedNotConfirmed { documents: usize, references: usize },
}

/// Oracle 调用错误
///
/// 传输、鉴权、限流、服务端错误都会转换成这里的某个变体，
/// 原始的 reqwest / async-openai 错误不会越过适配层。
#[derive(Debug, Error)]
pub enum OracleError {
    /// 读取待校验文件失败
    #[error("无法读取文件 {name}: {source}")]
    InputUnreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// 网络请求失败（连接、超时、TLS 等）
    #[error("请求失败 ({provider}): {message}")]
    RequestFailed { provider: String, message: String },

    /// 鉴权失败
    #[error("鉴权失败 ({provider}): HTTP {status}")]
    Unauthorized { provider: String, status: u16 },

    /// 请求频率限制
    #[error("请求频率限制 ({provider}), 建议等待: {retry_after:?}秒")]
    RateLimited {
        provider: String,
        retry_after: Option<u64>,
    },

    /// 服务端返回错误响应
    #[error("错误响应 ({provider}): HTTP {status}: {message}")]
    BadResponse {
        provider: String,
        status: u16,
        message: String,
    },

    /// 响应体无法解析
    #[error("无法解析响应 ({provider}): {message}")]
    MalformedResponse { provider: String, message: String },

    /// 返回中没有文本内容
    #[error("返回内容为空 ({provider})")]
    EmptyResponse { provider: String },

    /// 构造请求失败
    #[error("构造请求失败 ({provider}): {message}")]
    InvalidRequest { provider: String, message: String },
}

impl OracleError {
    /// 是否值得由调用方重试
    ///
    /// 503 和 529（服务过载）视为暂时性错误。
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OracleError::RequestFailed { .. }
                | OracleError::RateLimited { .. }
                | OracleError::BadResponse {
                    status: 503 | 529,
                    ..
                }
        )
    }

    /// 创建网络请求失败错误
    pub fn request_failed(provider: impl Into<String>, err: impl std::fmt::Display) -> Self {
        OracleError::RequestFailed {
            provider: provider.into(),
            message: err.to_string(),
        }
    }

    /// 按 HTTP 状态码归类非成功响应
    pub fn from_status(
        provider: impl Into<String>,
        status: u16,
        retry_after: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        let provider = provider.into();
        match status {
            401 | 403 => OracleError::Unauthorized { provider, status },
            429 => OracleError::RateLimited {
                provider,
                retry_after,
            },
            _ => OracleError::BadResponse {
                provider,
                status,
                message: message.into(),
            },
        }
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 目录不存在
    #[error("目录不存在: {}", .path.display())]
    DirectoryNotFound { path: PathBuf },

    /// 读取失败
    #[error("读取失败 ({}): {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 写入失败
    #[error("写入失败 ({}): {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("TOML解析失败 ({}): {source}", .path.display())]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: &'static str,
        value: String,
        expected_type: &'static str,
    },

    /// 缺少必需的配置项
    #[error("缺少必需的配置: {name}")]
    Missing { name: &'static str },

    /// 配置值不合法
    #[error("配置值不合法 {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
