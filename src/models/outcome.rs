//! 单对校验结果与汇总

use std::fmt;

use crate::models::pair::Pair;

/// 结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeStatus {
    /// 数据一致
    Match,
    /// Oracle 报告了差异
    Discrepancy,
    /// 调用失败或被取消
    Error,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutcomeStatus::Match => "MATCH",
            OutcomeStatus::Discrepancy => "DISCREPANCY",
            OutcomeStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// 一对文件的校验结果
///
/// 创建后不可变；`order_index` 是配对顺序中的位置（从 0 开始）。
#[derive(Debug, Clone)]
pub struct PairOutcome {
    pair: Pair,
    status: OutcomeStatus,
    detail: String,
    order_index: usize,
}

impl PairOutcome {
    pub fn new(pair: Pair, status: OutcomeStatus, detail: impl Into<String>, order_index: usize) -> Self {
        Self {
            pair,
            status,
            detail: detail.into(),
            order_index,
        }
    }

    pub fn pair(&self) -> &Pair {
        &self.pair
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    /// Oracle 原始文本，或错误信息
    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn order_index(&self) -> usize {
        self.order_index
    }
}

/// 汇总计数，总是从结果序列重新计算
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub match_count: usize,
    pub discrepancy_count: usize,
    pub error_count: usize,
    pub total: usize,
}
