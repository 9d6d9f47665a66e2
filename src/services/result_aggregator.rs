//! 结果汇总 - 业务能力层
//!
//! 分类、计数、生成报告文本。都是纯函数：同样的结果序列总是得到
//! 逐字节相同的报告。

use crate::models::{BatchSummary, OutcomeStatus, PairOutcome};
use crate::services::prompt::DISCREPANCY_MARKER;

/// 报告中分隔每个条目的横线宽度
pub const RULE_WIDTH: usize = 80;

/// 根据 Oracle 原文分类：包含 `DISCREPANCY`（区分大小写）即为差异
pub fn classify(response: &str) -> OutcomeStatus {
    if response.contains(DISCREPANCY_MARKER) {
        OutcomeStatus::Discrepancy
    } else {
        OutcomeStatus::Match
    }
}

/// 统计各状态数量
pub fn summarize(outcomes: &[PairOutcome]) -> BatchSummary {
    outcomes
        .iter()
        .fold(BatchSummary::default(), |mut summary, outcome| {
            match outcome.status() {
                OutcomeStatus::Match => summary.match_count += 1,
                OutcomeStatus::Discrepancy => summary.discrepancy_count += 1,
                OutcomeStatus::Error => summary.error_count += 1,
            }
            summary.total += 1;
            summary
        })
}

/// 生成完整报告
///
/// 条目按 `order_index` 排列，序号从 1 开始：
///
/// ```text
/// ====...====
///
/// CLAIM #1
/// PDF: claim_001.pdf
/// CSV: claim_001.csv
///
/// <Oracle 原文或错误信息>
/// ```
pub fn render(outcomes: &[PairOutcome]) -> String {
    let mut ordered: Vec<&PairOutcome> = outcomes.iter().collect();
    ordered.sort_by_key(|o| o.order_index());

    let rule = "=".repeat(RULE_WIDTH);
    let mut report = String::new();

    for (idx, outcome) in ordered.iter().enumerate() {
        if idx > 0 {
            report.push('\n');
        }
        report.push_str(&format!(
            "{rule}\n\nCLAIM #{}\nPDF: {}\nCSV: {}\n\n{}\n",
            idx + 1,
            outcome.pair().document_name(),
            outcome.pair().reference_name(),
            outcome.detail()
        ));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileHandle, FileKind, MatchKey, Pair};

    fn outcome(name: &str, status: OutcomeStatus, detail: &str, order_index: usize) -> PairOutcome {
        let pair = Pair::new(
            MatchKey::new(name),
            FileHandle::from_bytes(format!("{name}.pdf"), FileKind::Document, Vec::new()),
            FileHandle::from_bytes(format!("{name}.csv"), FileKind::Reference, Vec::new()),
        );
        PairOutcome::new(pair, status, detail, order_index)
    }

    #[test]
    fn test_classify_marker() {
        assert_eq!(
            classify("**Status:** DISCREPANCY FOUND\n..."),
            OutcomeStatus::Discrepancy
        );
        assert_eq!(
            classify("totals ok; DISCREPANCY FOUND in names"),
            OutcomeStatus::Discrepancy
        );
        assert_eq!(classify("**Status:** MATCH"), OutcomeStatus::Match);
        assert_eq!(classify("discrepancy found"), OutcomeStatus::Match);
        assert_eq!(classify(""), OutcomeStatus::Match);
    }

    #[test]
    fn test_summarize_counts() {
        let outcomes = vec![
            outcome("a", OutcomeStatus::Match, "ok", 0),
            outcome("b", OutcomeStatus::Discrepancy, "DISCREPANCY", 1),
            outcome("c", OutcomeStatus::Error, "boom", 2),
            outcome("d", OutcomeStatus::Match, "ok", 3),
        ];

        let summary = summarize(&outcomes);
        assert_eq!(
            summary,
            BatchSummary {
                match_count: 2,
                discrepancy_count: 1,
                error_count: 1,
                total: 4,
            }
        );
        assert_eq!(
            summary.match_count + summary.discrepancy_count + summary.error_count,
            summary.total
        );
        assert_eq!(summarize(&[]), BatchSummary::default());
    }

    #[test]
    fn test_render_exact_format() {
        let outcomes = vec![
            outcome("claim_001", OutcomeStatus::Match, "**Status:** MATCH", 0),
            outcome("claim_002", OutcomeStatus::Error, "❌ Error processing: timeout", 1),
        ];

        let rule = "=".repeat(80);
        let expected = format!(
            "{rule}\n\nCLAIM #1\nPDF: claim_001.pdf\nCSV: claim_001.csv\n\n**Status:** MATCH\n\
             \n{rule}\n\nCLAIM #2\nPDF: claim_002.pdf\nCSV: claim_002.csv\n\n❌ Error processing: timeout\n"
        );

        assert_eq!(render(&outcomes), expected);
    }

    #[test]
    fn test_render_follows_order_index() {
        let outcomes = vec![
            outcome("second", OutcomeStatus::Match, "x", 1),
            outcome("first", OutcomeStatus::Match, "x", 0),
        ];

        let report = render(&outcomes);
        let first = report.find("PDF: first.pdf").unwrap();
        let second = report.find("PDF: second.pdf").unwrap();
        assert!(first < second);
        assert!(report[..first].contains("CLAIM #1"));
    }

    #[test]
    fn test_render_keeps_pair_order_for_equal_content() {
        let outcomes = vec![
            outcome("zeta", OutcomeStatus::Match, "same", 0),
            outcome("alpha", OutcomeStatus::Match, "same", 1),
            outcome("mid", OutcomeStatus::Match, "same", 2),
        ];

        let report = render(&outcomes);
        let positions: Vec<usize> = ["zeta", "alpha", "mid"]
            .iter()
            .map(|n| report.find(&format!("PDF: {n}.pdf")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_render_is_idempotent() {
        let outcomes = vec![
            outcome("a", OutcomeStatus::Discrepancy, "DISCREPANCY FOUND", 0),
            outcome("b", OutcomeStatus::Match, "MATCH", 1),
        ];
        assert_eq!(render(&outcomes), render(&outcomes));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[]), "");
    }
}
