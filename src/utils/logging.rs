/// 日志工具模块
///
/// 提供 tracing 初始化以及日志格式化和输出的辅助函数
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{BatchSummary, MatchResult};
use crate::orchestrator::Progress;

/// 初始化 tracing
///
/// `RUST_LOG` 优先；未设置时 verbose 为 debug，否则为 info。
/// 重复调用不会报错。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - 理赔账单校验 ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📂 PDF 目录: {}", config.documents_dir);
    info!("📂 CSV 目录: {}", config.references_dir);
    info!(
        "🤖 Oracle: {:?} / {}",
        config.oracle_provider, config.oracle_model_name
    );
    info!("📊 最大并发数: {}", config.max_concurrent_pairs);
    info!("{}", "=".repeat(60));
}

/// 记录配对结果
///
/// 重名覆盖和未配对文件以 warn 级别输出，逐条的冲突明细由配对服务记录
pub fn log_match_result(result: &MatchResult) {
    info!("✓ 配对成功: {} 对", result.pairs.len());

    if !result.collisions.is_empty() {
        warn!(
            "⚠️ {} 个文件因归一化后重名被覆盖，未参与校验",
            result.collisions.len()
        );
    }

    if !result.unmatched_documents.is_empty() {
        warn!(
            "⚠️ 未配对的 PDF ({}): {}",
            result.unmatched_documents.len(),
            result.unmatched_documents.join(", ")
        );
    }
    if !result.unmatched_references.is_empty() {
        warn!(
            "⚠️ 未配对的 CSV ({}): {}",
            result.unmatched_references.len(),
            result.unmatched_references.join(", ")
        );
    }
}

/// 记录批次开始信息
pub fn log_batch_start(total: usize, max_concurrent: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始校验 {} 对文件", total);
    if max_concurrent > 1 {
        info!("📋 最多同时校验 {} 对", max_concurrent);
    }
    info!("{}", "=".repeat(60));
}

/// 记录单对完成进度
pub fn log_progress(progress: &Progress) {
    info!(
        "⏳ 进度 {}/{}: {}",
        progress.completed, progress.total, progress.current_name
    );
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &BatchSummary, report_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部校验完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 一致: {}/{}", summary.match_count, summary.total);
    info!("⚠️ 差异: {}", summary.discrepancy_count);
    info!("❌ 错误: {}", summary.error_count);
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", report_path.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
