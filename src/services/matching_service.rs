/// 文件配对服务
///
/// 按归一化后的文件名把 PDF 和 CSV 两组文件两两配对
use crate::models::{FileHandle, FileKind, KeyCollision, MatchKey, MatchResult, Pair};
use crate::services::name_normalizer::NameNormalizer;
use indexmap::IndexMap;
use tracing::{debug, warn};

/// 文件配对服务
///
/// - 纯分类函数，没有副作用，不会失败
/// - 同一侧出现重复键时后出现的文件覆盖先出现的，键保留第一次出现的位置
/// - 被覆盖的文件记录为 `KeyCollision`，由调用方决定如何提示
#[derive(Debug, Clone, Default)]
pub struct MatchingService {
    normalizer: NameNormalizer,
}

impl MatchingService {
    pub fn new(normalizer: NameNormalizer) -> Self {
        Self { normalizer }
    }

    /// 配对两组文件
    ///
    /// # 参数
    /// - `documents`: PDF 文件
    /// - `references`: CSV 文件
    ///
    /// # 返回
    /// 配对列表（按 PDF 侧键的出现顺序）、两侧未配对的文件名、键冲突
    pub fn match_files(&self, documents: &[FileHandle], references: &[FileHandle]) -> MatchResult {
        let mut collisions = Vec::new();
        let document_map = self.build_key_map(documents, FileKind::Document, &mut collisions);
        let reference_map = self.build_key_map(references, FileKind::Reference, &mut collisions);

        let mut result = MatchResult {
            collisions,
            ..Default::default()
        };

        for (key, document) in &document_map {
            match reference_map.get(key) {
                Some(reference) => {
                    debug!("配对成功 [{}]: {} ↔ {}", key, document.name(), reference.name());
                    result
                        .pairs
                        .push(Pair::new(key.clone(), document.clone(), reference.clone()));
                }
                None => result.unmatched_documents.push(document.name().to_string()),
            }
        }

        for (key, reference) in &reference_map {
            if !document_map.contains_key(key) {
                result.unmatched_references.push(reference.name().to_string());
            }
        }

        result
    }

    /// 构建 键 → 文件 的映射，覆盖时记录冲突
    fn build_key_map(
        &self,
        files: &[FileHandle],
        kind: FileKind,
        collisions: &mut Vec<KeyCollision>,
    ) -> IndexMap<MatchKey, FileHandle> {
        let mut map: IndexMap<MatchKey, FileHandle> = IndexMap::with_capacity(files.len());

        for file in files {
            let key = self.normalizer.normalize(file.name());
            if let Some(previous) = map.insert(key.clone(), file.clone()) {
                warn!(
                    "⚠️ {} 文件 {} 与 {} 的配对键相同 [{}]，保留后者",
                    kind,
                    previous.name(),
                    file.name(),
                    key
                );
                collisions.push(KeyCollision {
                    key,
                    kind,
                    kept: file.name().to_string(),
                    dropped: previous.name().to_string(),
                });
            }
        }

        map
    }
}
