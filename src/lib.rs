//! # Claims Verify
//!
//! 保险理赔账单（PDF）与参考数据（CSV）批量核对工具
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 适配层（Clients）
//! - `clients/` - 把"PDF + 提示词"发送给外部 Oracle，只返回文本
//! - `AnthropicClient` - Anthropic Messages API
//! - `LlmClient` - 兼容 OpenAI 的 Chat Completions 接口
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `NameNormalizer` / `MatchingService` - 文件名归一化与配对
//! - `VerificationService` - 单对文件校验
//! - `result_aggregator` - 分类、计数、渲染报告
//! - `ReportWriter` - 写报告文件
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一对文件"的完整处理流程
//! - `PairCtx` - 上下文封装（序号 + 文件名）
//! - `PairFlow` - 流程编排（校验 → 重试 → 分类）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 应用入口，加载、配对、汇总
//! - `orchestrator/batch_runner` - 逐对执行，控制并发和取消
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{build_oracle, OracleRequest, VerificationOracle};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{BatchSummary, FileHandle, FileKind, MatchResult, OutcomeStatus, Pair, PairOutcome};
pub use orchestrator::{App, BatchRunner, CancellationFlag, Progress, RunReport};
pub use services::{MatchingService, NameNormalizer, PromptTemplate, VerificationService};
pub use workflow::{PairCtx, PairFlow, RetryPolicy};
