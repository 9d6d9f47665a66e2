//! 报告写入服务 - 业务能力层
//!
//! 只负责"把报告写到文件"能力，不关心报告内容怎么生成

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::FileError;

/// 报告写入服务
pub struct ReportWriter {
    report_path: PathBuf,
}

impl ReportWriter {
    /// 使用默认文件名创建
    pub fn new() -> Self {
        Self {
            report_path: PathBuf::from("claims_verification_report.txt"),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            report_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.report_path
    }

    /// 写入报告，覆盖已有文件，必要时创建父目录
    pub async fn write(&self, report: &str) -> Result<(), FileError> {
        debug!(
            "写入报告: {} ({} 字节)",
            self.report_path.display(),
            report.len()
        );

        if let Some(parent) = self.report_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FileError::WriteFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&self.report_path, report)
            .await
            .map_err(|source| FileError::WriteFailed {
                path: self.report_path.clone(),
                source,
            })
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}
