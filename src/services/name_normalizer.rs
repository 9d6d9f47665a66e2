//! 文件名归一化 - 业务能力层
//!
//! 把文件名转换成配对键：
//! 1. 去掉扩展名（最后一个 `.` 之后的部分）
//! 2. 去掉已知的单据后缀词（`_invoice`、`_claim` 等）
//! 3. 转小写并去掉首尾空白
//!
//! 后缀词的移除是区分大小写的，并且发生在转小写之前，
//! 所以 `Claim_001_INVOICE.pdf` 得到的是 `claim_001_invoice`。

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::models::MatchKey;

/// 需要移除的单据后缀词，按顺序依次处理
pub const KNOWN_TOKENS: [&str; 6] = [
    "_invoice",
    "_claim",
    "_statement",
    " invoice",
    " claim",
    " statement",
];

/// 后缀词的移除方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStripping {
    /// 出现在任何位置都移除（兼容既有行为）
    #[default]
    Anywhere,
    /// 只移除结尾处的后缀词
    TrailingOnly,
}

impl FromStr for TokenStripping {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anywhere" => Ok(TokenStripping::Anywhere),
            "trailing" | "trailing_only" => Ok(TokenStripping::TrailingOnly),
            _ => Err(ConfigError::EnvVarParseFailed {
                var_name: "CLAIMS_TOKEN_STRIPPING",
                value: s.to_string(),
                expected_type: "anywhere | trailing",
            }),
        }
    }
}

/// 文件名归一化器
#[derive(Debug, Clone, Copy, Default)]
pub struct NameNormalizer {
    stripping: TokenStripping,
}

impl NameNormalizer {
    pub fn new(stripping: TokenStripping) -> Self {
        Self { stripping }
    }

    /// 计算文件名的配对键，纯函数，不会失败
    pub fn normalize(&self, filename: &str) -> MatchKey {
        let stem = file_stem(filename);
        let stripped = match self.stripping {
            TokenStripping::Anywhere => strip_tokens_anywhere(stem),
            TokenStripping::TrailingOnly => strip_trailing_tokens(stem),
        };
        MatchKey::new(stripped.trim().to_lowercase())
    }
}

/// 使用默认策略归一化
pub fn normalize(filename: &str) -> MatchKey {
    NameNormalizer::default().normalize(filename)
}

/// 文件名主干：最后一段路径去掉扩展名
fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}

/// 在主干的任意位置移除所有已知后缀词
///
/// 注意 `claim_invoice_042` 会变成 `claim_042`，中间的词也会被删掉。
pub fn strip_tokens_anywhere(stem: &str) -> String {
    KNOWN_TOKENS
        .iter()
        .fold(stem.to_string(), |name, token| name.replace(token, ""))
}

/// 只移除结尾的后缀词，每个词最多移除一次
pub fn strip_trailing_tokens(stem: &str) -> String {
    let mut name = stem;
    for token in KNOWN_TOKENS {
        if let Some(rest) = name.strip_suffix(token) {
            name = rest;
        }
    }
    name.to_string()
}
