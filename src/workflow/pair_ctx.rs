//! 配对处理上下文
//!
//! 封装"我正在处理第几对文件"这一信息

use std::fmt::Display;

/// 配对处理上下文
#[derive(Debug, Clone)]
pub struct PairCtx {
    /// 在配对列表中的位置（从 0 开始），即结果的 order_index
    pub order_index: usize,

    /// 本批配对总数
    pub total: usize,

    /// PDF 文件名（仅用于日志显示）
    pub document_name: String,
}

impl PairCtx {
    pub fn new(order_index: usize, total: usize, document_name: impl Into<String>) -> Self {
        Self {
            order_index,
            total,
            document_name: document_name.into(),
        }
    }

    /// 从 1 开始的序号
    pub fn number(&self) -> usize {
        self.order_index + 1
    }
}

impl Display for PairCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[配对 {}/{} {}]",
            self.number(),
            self.total,
            self.document_name
        )
    }
}
