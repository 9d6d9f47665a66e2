use crate::error::FileError;
use crate::models::file_handle::{FileHandle, FileKind};
use std::path::Path;
use tokio::fs;

/// 扫描目录，返回扩展名符合 `kind` 的所有文件句柄
///
/// 扩展名比较不区分大小写；子目录不递归。
/// 结果按文件名排序，保证同一目录每次得到相同的配对顺序。
pub async fn load_files_from_dir(
    folder: impl AsRef<Path>,
    kind: FileKind,
) -> Result<Vec<FileHandle>, FileError> {
    let folder = folder.as_ref();

    let is_dir = fs::metadata(folder)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(FileError::DirectoryNotFound {
            path: folder.to_path_buf(),
        });
    }

    let mut entries = fs::read_dir(folder)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: folder.to_path_buf(),
            source,
        })?;

    let mut handles = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => {
                return Err(FileError::ReadFailed {
                    path: folder.to_path_buf(),
                    source,
                })
            }
        };

        // 符号链接跟随到目标再判断
        let is_file = fs::metadata(entry.path())
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        let path = entry.path();

        let matches_kind = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(kind.extension()));

        if matches_kind {
            tracing::debug!("发现{}文件: {}", kind, path.display());
            handles.push(FileHandle::from_path(path, kind));
        }
    }

    handles.sort_by(|a, b| a.name().cmp(b.name()));

    tracing::info!(
        "📁 {} 中找到 {} 个 {} 文件",
        folder.display(),
        handles.len(),
        kind
    );

    Ok(handles)
}
