//! 未配对文件的确认
//!
//! 存在未配对文件时按 `UnmatchedPolicy` 决定是否继续。
//! 交互模式下在终端询问，非终端环境一律视为拒绝。

use std::io::{IsTerminal, Write};
use tracing::warn;

use crate::config::UnmatchedPolicy;
use crate::models::MatchResult;

/// 是否继续处理已配对的文件
///
/// 没有未配对文件时直接返回 `true`。
pub async fn confirm_unmatched(policy: UnmatchedPolicy, result: &MatchResult) -> bool {
    if !result.has_unmatched() {
        return true;
    }

    match policy {
        UnmatchedPolicy::Continue => {
            warn!("⚠️ 存在未配对文件，按配置只处理已配对的文件");
            true
        }
        UnmatchedPolicy::Abort => false,
        UnmatchedPolicy::Prompt => ask_on_terminal(result).await,
    }
}

async fn ask_on_terminal(result: &MatchResult) -> bool {
    if !std::io::stdin().is_terminal() {
        warn!("⚠️ 标准输入不是终端，无法确认，按拒绝处理");
        return false;
    }

    let question = prompt_text(result);
    let answer = tokio::task::spawn_blocking(move || {
        print!("{}", question);
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await;

    match answer {
        Ok(Ok(line)) => is_yes(&line),
        _ => false,
    }
}

/// 确认提示：未配对文件、重名覆盖，最后是问题本身
pub fn prompt_text(result: &MatchResult) -> String {
    let mut text = String::new();
    for name in &result.unmatched_documents {
        text.push_str(&format!("  未配对 PDF: {}\n", name));
    }
    for name in &result.unmatched_references {
        text.push_str(&format!("  未配对 CSV: {}\n", name));
    }
    for c in &result.collisions {
        text.push_str(&format!("  重名 {}: {} 覆盖了 {}\n", c.kind, c.kept, c.dropped));
    }
    text.push_str(&format!(
        "继续处理 {} 对已配对的文件？ [y/N]: ",
        result.pairs.len()
    ));
    text
}

/// 只有 `y` / `yes`（不区分大小写）算作同意
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileKind, KeyCollision, MatchKey};

    fn with_unmatched() -> MatchResult {
        MatchResult {
            unmatched_documents: vec!["orphan.pdf".to_string()],
            ..MatchResult::default()
        }
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes("  YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }

    #[test]
    fn test_prompt_text_lists_everything() {
        let mut result = with_unmatched();
        result.unmatched_references.push("lonely.csv".to_string());
        result.collisions.push(KeyCollision {
            key: MatchKey::new("a"),
            kind: FileKind::Document,
            kept: "A.pdf".to_string(),
            dropped: "a.pdf".to_string(),
        });

        let text = prompt_text(&result);
        assert!(text.contains("未配对 PDF: orphan.pdf"));
        assert!(text.contains("未配对 CSV: lonely.csv"));
        assert!(text.contains("重名 PDF: A.pdf 覆盖了 a.pdf"));
        assert!(text.ends_with("继续处理 0 对已配对的文件？ [y/N]: "));
    }

    #[tokio::test]
    async fn test_nothing_unmatched_needs_no_confirmation() {
        let result = MatchResult::default();
        assert!(confirm_unmatched(UnmatchedPolicy::Abort, &result).await);
    }

    #[test]
    fn test_policies() {
        let result = with_unmatched();
        assert!(tokio_test::block_on(confirm_unmatched(
            UnmatchedPolicy::Continue,
            &result
        )));
        assert!(!tokio_test::block_on(confirm_unmatched(
            UnmatchedPolicy::Abort,
            &result
        )));
    }
}
