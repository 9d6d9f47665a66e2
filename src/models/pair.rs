use std::fmt;

use crate::models::file_handle::{FileHandle, FileKind};

/// 文件名归一化后得到的配对键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey(String);

impl MatchKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 共享同一个 MatchKey 的一对文件
#[derive(Debug, Clone)]
pub struct Pair {
    pub key: MatchKey,
    pub document: FileHandle,
    pub reference: FileHandle,
}

impl Pair {
    pub fn new(key: MatchKey, document: FileHandle, reference: FileHandle) -> Self {
        Self {
            key,
            document,
            reference,
        }
    }

    pub fn document_name(&self) -> &str {
        self.document.name()
    }

    pub fn reference_name(&self) -> &str {
        self.reference.name()
    }
}

/// 同一侧两个文件归一化成同一个键，前一个被后一个覆盖
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    pub key: MatchKey,
    pub kind: FileKind,
    /// 保留下来的文件名（后出现的）
    pub kept: String,
    /// 被覆盖的文件名
    pub dropped: String,
}

/// 配对结果
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub pairs: Vec<Pair>,
    pub unmatched_documents: Vec<String>,
    pub unmatched_references: Vec<String>,
    pub collisions: Vec<KeyCollision>,
}

impl MatchResult {
    pub fn has_unmatched(&self) -> bool {
        !self.unmatched_documents.is_empty() || !self.unmatched_references.is_empty()
    }
}
