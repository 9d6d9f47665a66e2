//! 上传文件句柄
//!
//! 名字可以随时读取而不触碰内容；内容可以重复读取（路径每次重新读，
//! 内存缓冲区共享同一份数据）。

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 文件类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// 待校验文档（PDF）
    Document,
    /// 参考数据（CSV）
    Reference,
}

impl FileKind {
    /// 报告里使用的标签
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Document => "PDF",
            FileKind::Reference => "CSV",
        }
    }

    /// 目录扫描时接受的扩展名（不区分大小写）
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Document => "pdf",
            FileKind::Reference => "csv",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

/// 上传文件的不透明引用
#[derive(Debug, Clone)]
pub struct FileHandle {
    name: String,
    kind: FileKind,
    source: FileSource,
}

impl FileHandle {
    /// 从磁盘路径创建，名字取最后一段文件名
    pub fn from_path(path: impl Into<PathBuf>, kind: FileKind) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            name,
            kind,
            source: FileSource::Path(path),
        }
    }

    /// 从内存内容创建
    pub fn from_bytes(name: impl Into<String>, kind: FileKind, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            kind,
            source: FileSource::Memory(Arc::from(bytes.into())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// 磁盘路径（内存文件返回 None）
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            FileSource::Path(p) => Some(p),
            FileSource::Memory(_) => None,
        }
    }

    /// 完整读取内容，可重复调用
    pub async fn bytes(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            FileSource::Path(p) => tokio::fs::read(p).await,
            FileSource::Memory(data) => Ok(data.to_vec()),
        }
    }
}
