//! 批量校验处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整运行的资源装配和流程调度。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：构建 Oracle 客户端、提示词模板、校验流程
//! 2. **批量加载**：扫描 PDF / CSV 目录
//! 3. **配对**：按归一化文件名配对，报告未配对和重名文件
//! 4. **确认**：存在未配对文件时按配置询问或终止
//! 5. **批量校验**：委托 `BatchRunner`，单对失败不影响其他配对
//! 6. **汇总输出**：统计计数、渲染报告、写入文件
//!
//! 没有任何配对时在调用 Oracle 之前直接终止。
//! 批次开始前收到取消同样直接终止；批次进行中取消，剩余配对记为 Error，
//! 报告照常写入。

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::clients::{build_oracle, VerificationOracle};
use crate::config::Config;
use crate::error::{AppError, AppResult, FileError, MatchError};
use crate::models::{load_files_from_dir, BatchSummary, FileHandle, FileKind, MatchResult, PairOutcome};
use crate::orchestrator::batch_runner::{BatchRunner, CancellationFlag};
use crate::orchestrator::confirmation::confirm_unmatched;
use crate::services::result_aggregator::{render, summarize};
use crate::services::{MatchingService, NameNormalizer, PromptTemplate, ReportWriter, VerificationService};
use crate::utils::logging::{
    log_batch_start, log_match_result, log_progress, log_startup, print_final_stats,
};
use crate::workflow::{PairFlow, RetryPolicy};

/// 一次运行的全部产出
#[derive(Debug)]
pub struct RunReport {
    pub matched: MatchResult,
    /// 按配对顺序排列
    pub outcomes: Vec<PairOutcome>,
    pub summary: BatchSummary,
    /// 写入报告文件的文本
    pub report: String,
}

/// 应用主结构
pub struct App {
    config: Config,
    matcher: MatchingService,
    runner: BatchRunner,
    writer: ReportWriter,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let oracle = build_oracle(&config)?;
        Self::with_oracle(config, oracle)
    }

    /// 使用指定的 Oracle 装配应用
    pub fn with_oracle(config: Config, oracle: Arc<dyn VerificationOracle>) -> Result<Self> {
        let template = load_template(&config)?;

        let flow = PairFlow::new(
            VerificationService::new(oracle, template),
            RetryPolicy {
                max_retries: config.oracle_max_retries,
                backoff: Duration::from_millis(config.retry_backoff_ms),
            },
        );
        let runner = BatchRunner::new(flow, config.max_concurrent_pairs);
        let matcher = MatchingService::new(NameNormalizer::new(config.token_stripping));
        let writer = ReportWriter::with_path(&config.report_file);

        Ok(Self {
            config,
            matcher,
            runner,
            writer,
        })
    }

    /// 取消标记，置位后尚未开始的配对不再调用 Oracle
    pub fn cancellation(&self) -> CancellationFlag {
        self.runner.cancellation()
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunReport> {
        info!("\n📁 正在扫描待处理的文件...");
        let documents =
            load_files_from_dir(&self.config.documents_dir, FileKind::Document).await?;
        let references =
            load_files_from_dir(&self.config.references_dir, FileKind::Reference).await?;

        Ok(self.process(&documents, &references).await?)
    }

    /// 配对并校验给定的文件
    pub async fn process(
        &self,
        documents: &[FileHandle],
        references: &[FileHandle],
    ) -> AppResult<RunReport> {
        let matched = self.matcher.match_files(documents, references);
        log_match_result(&matched);

        if matched.pairs.is_empty() {
            return Err(MatchError::NoMatches.into());
        }

        self.ensure_not_cancelled()?;

        if !confirm_unmatched(self.config.unmatched_policy, &matched).await {
            return Err(MatchError::UnmatchedNotConfirmed {
                documents: matched.unmatched_documents.len(),
                references: matched.unmatched_references.len(),
            }
            .into());
        }

        // 确认提示期间可能收到中断
        self.ensure_not_cancelled()?;

        log_batch_start(matched.pairs.len(), self.config.max_concurrent_pairs);

        let outcomes = self
            .runner
            .run(matched.pairs.clone(), |progress| log_progress(&progress))
            .await;

        let summary = summarize(&outcomes);
        let report = render(&outcomes);

        self.writer.write(&report).await?;
        print_final_stats(&summary, self.writer.path());

        Ok(RunReport {
            matched,
            outcomes,
            summary,
            report,
        })
    }

    /// 批次开始前已取消则直接终止，不覆盖已有报告
    fn ensure_not_cancelled(&self) -> AppResult<()> {
        if self.runner.cancellation().is_cancelled() {
            warn!("⏹ 已取消，不再开始校验");
            return Err(AppError::Cancelled);
        }
        Ok(())
    }
}

/// 读取提示词模板，未配置文件时使用内置模板
fn load_template(config: &Config) -> Result<PromptTemplate, FileError> {
    let mut template =
        PromptTemplate::for_carrier(config.prompt_carrier_name.clone(), config.page_layout.clone());

    if let Some(path) = &config.prompt_template_file {
        let body = std::fs::read_to_string(path).map_err(|source| FileError::ReadFailed {
            path: path.into(),
            source,
        })?;
        template = template.with_body(body);
        info!("📝 使用自定义提示词模板: {}", path);
    }

    if !template.has_reference_slot() {
        warn!("⚠️ 提示词模板中没有 {{{{reference_text}}}} 占位符，CSV 内容不会发送给 Oracle");
    }

    Ok(template)
}
