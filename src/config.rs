//! 程序配置
//!
//! 优先级：默认值 < TOML 配置文件（`CLAIMS_CONFIG_FILE`） < 环境变量。

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ConfigError, FileError};
use crate::services::name_normalizer::TokenStripping;
use crate::services::prompt::PageLayout;

/// 存在未配对文件时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    /// 在终端询问
    #[default]
    Prompt,
    /// 只处理已配对的文件
    Continue,
    /// 直接终止
    Abort,
}

impl FromStr for UnmatchedPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prompt" => Ok(UnmatchedPolicy::Prompt),
            "continue" => Ok(UnmatchedPolicy::Continue),
            "abort" => Ok(UnmatchedPolicy::Abort),
            _ => Err(ConfigError::EnvVarParseFailed {
                var_name: "CLAIMS_UNMATCHED_POLICY",
                value: s.to_string(),
                expected_type: "prompt | continue | abort",
            }),
        }
    }
}

/// Oracle 服务提供方
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleProvider {
    /// Anthropic Messages API
    #[default]
    Anthropic,
    /// 兼容 OpenAI 的 Chat Completions 接口
    OpenAi,
}

impl OracleProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            OracleProvider::Anthropic => "https://api.anthropic.com",
            OracleProvider::OpenAi => "https://api.openai.com/v1",
        }
    }
}

impl FromStr for OracleProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(OracleProvider::Anthropic),
            "openai" => Ok(OracleProvider::OpenAi),
            _ => Err(ConfigError::EnvVarParseFailed {
                var_name: "ORACLE_PROVIDER",
                value: s.to_string(),
                expected_type: "anthropic | openai",
            }),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// PDF 文件目录
    pub documents_dir: String,
    /// CSV 文件目录
    pub references_dir: String,
    /// 报告输出文件
    pub report_file: String,
    /// 未配对文件的处理方式
    pub unmatched_policy: UnmatchedPolicy,
    /// 同时在途的 Oracle 请求数，1 表示严格串行
    pub max_concurrent_pairs: usize,
    /// 文件名后缀词的移除方式
    pub token_stripping: TokenStripping,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- Oracle 配置 ---
    pub oracle_provider: OracleProvider,
    pub oracle_api_key: String,
    /// 为空时使用 provider 的默认地址
    pub oracle_api_base_url: Option<String>,
    pub oracle_model_name: String,
    pub oracle_max_tokens: u32,
    pub oracle_timeout_secs: u64,
    /// 可重试错误的重试次数（0 表示不重试）
    pub oracle_max_retries: u32,
    pub retry_backoff_ms: u64,
    // --- 提示词配置 ---
    pub prompt_template_file: Option<String>,
    pub prompt_carrier_name: String,
    pub page_layout: PageLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            documents_dir: "input/pdf".to_string(),
            references_dir: "input/csv".to_string(),
            report_file: "claims_verification_report.txt".to_string(),
            unmatched_policy: UnmatchedPolicy::Prompt,
            max_concurrent_pairs: 1,
            token_stripping: TokenStripping::Anywhere,
            verbose_logging: false,
            oracle_provider: OracleProvider::Anthropic,
            oracle_api_key: String::new(),
            oracle_api_base_url: None,
            oracle_model_name: "claude-sonnet-4-20250514".to_string(),
            oracle_max_tokens: 2000,
            oracle_timeout_secs: 180,
            oracle_max_retries: 0,
            retry_backoff_ms: 2000,
            prompt_template_file: None,
            prompt_carrier_name: "United Healthcare".to_string(),
            page_layout: PageLayout::default(),
        }
    }
}

impl Config {
    pub const ENV_CONFIG_FILE: &'static str = "CLAIMS_CONFIG_FILE";

    /// 加载配置：默认值，叠加可选的 TOML 文件，再叠加环境变量
    pub fn load() -> anyhow::Result<Self> {
        let base = match std::env::var(Self::ENV_CONFIG_FILE) {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(path.trim())?,
            _ => Self::default(),
        };
        let config = base.with_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 只从环境变量读取（不读配置文件）
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// 读取 TOML 配置文件，缺省字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| FileError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 用 `lookup` 提供的变量覆盖当前配置
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("CLAIMS_DOCUMENTS_DIR") {
            self.documents_dir = v;
        }
        if let Some(v) = get("CLAIMS_REFERENCES_DIR") {
            self.references_dir = v;
        }
        if let Some(v) = get("CLAIMS_REPORT_FILE") {
            self.report_file = v;
        }
        if let Some(v) = get("CLAIMS_UNMATCHED_POLICY") {
            self.unmatched_policy = v.parse()?;
        }
        if let Some(v) = get("CLAIMS_MAX_CONCURRENT_PAIRS") {
            self.max_concurrent_pairs = parse_var("CLAIMS_MAX_CONCURRENT_PAIRS", &v, "usize")?;
        }
        if let Some(v) = get("CLAIMS_TOKEN_STRIPPING") {
            self.token_stripping = v.parse()?;
        }
        if let Some(v) = get("VERBOSE_LOGGING") {
            self.verbose_logging = parse_var("VERBOSE_LOGGING", &v, "bool")?;
        }
        if let Some(v) = get("ORACLE_PROVIDER") {
            self.oracle_provider = v.parse()?;
        }
        if let Some(v) = get("ORACLE_API_KEY") {
            self.oracle_api_key = v;
        }
        if let Some(v) = get("ORACLE_API_BASE_URL") {
            self.oracle_api_base_url = Some(v);
        }
        if let Some(v) = get("ORACLE_MODEL_NAME") {
            self.oracle_model_name = v;
        }
        if let Some(v) = get("ORACLE_MAX_TOKENS") {
            self.oracle_max_tokens = parse_var("ORACLE_MAX_TOKENS", &v, "u32")?;
        }
        if let Some(v) = get("ORACLE_TIMEOUT_SECS") {
            self.oracle_timeout_secs = parse_var("ORACLE_TIMEOUT_SECS", &v, "u64")?;
        }
        if let Some(v) = get("ORACLE_MAX_RETRIES") {
            self.oracle_max_retries = parse_var("ORACLE_MAX_RETRIES", &v, "u32")?;
        }
        if let Some(v) = get("ORACLE_RETRY_BACKOFF_MS") {
            self.retry_backoff_ms = parse_var("ORACLE_RETRY_BACKOFF_MS", &v, "u64")?;
        }
        if let Some(v) = get("PROMPT_TEMPLATE_FILE") {
            self.prompt_template_file = Some(v);
        }
        if let Some(v) = get("PROMPT_CARRIER_NAME") {
            self.prompt_carrier_name = v;
        }

        Ok(self)
    }

    /// 校验启动前必须满足的条件
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.oracle_api_key.trim().is_empty() {
            return Err(ConfigError::Missing {
                name: "ORACLE_API_KEY",
            });
        }
        if self.max_concurrent_pairs == 0 {
            return Err(ConfigError::Invalid {
                name: "CLAIMS_MAX_CONCURRENT_PAIRS",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.oracle_max_tokens == 0 {
            return Err(ConfigError::Invalid {
                name: "ORACLE_MAX_TOKENS",
                reason: "必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// 实际使用的 Oracle 地址
    pub fn oracle_base_url(&self) -> &str {
        self.oracle_api_base_url
            .as_deref()
            .unwrap_or_else(|| self.oracle_provider.default_base_url())
    }
}

fn parse_var<T: FromStr>(
    var_name: &'static str,
    value: &str,
    expected_type: &'static str,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name,
            value: value.to_string(),
            expected_type,
        })
}
