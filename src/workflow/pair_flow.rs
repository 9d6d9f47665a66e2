//! 配对处理流程 - 流程层
//!
//! 核心职责：定义"一对文件"的完整处理流程
//!
//! 流程顺序：
//! 1. 校验服务调用 Oracle
//! 2. 可重试错误按配置重试
//! 3. 成功 → 按标记分类；失败 → 记录为 Error
//!
//! 不论成功与否都返回一个 `PairOutcome`，错误不会向上传播。

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::OracleError;
use crate::models::{OutcomeStatus, Pair, PairOutcome};
use crate::services::result_aggregator::classify;
use crate::services::VerificationService;
use crate::utils::truncate_text;
use crate::workflow::pair_ctx::PairCtx;

/// 重试策略，由调用方决定，校验服务本身不重试
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

/// 配对处理流程
///
/// - 编排单对文件的校验
/// - 决定是否重试、如何分类
/// - 不持有批次状态
pub struct PairFlow {
    verification: VerificationService,
    retry: RetryPolicy,
}

impl PairFlow {
    pub fn new(verification: VerificationService, retry: RetryPolicy) -> Self {
        Self {
            verification,
            retry,
        }
    }

    /// 处理一对文件
    pub async fn run(&self, pair: Pair, ctx: &PairCtx) -> PairOutcome {
        info!(
            "{} 🔍 正在校验 [{}]: {} ↔ {}",
            ctx,
            self.verification.provider(),
            pair.document_name(),
            pair.reference_name()
        );

        match self.verify_with_retry(&pair, ctx).await {
            Ok(response) => {
                debug!("{} 响应: {}", ctx, truncate_text(&response, 200));
                let status = classify(&response);
                match status {
                    OutcomeStatus::Discrepancy => warn!("{} ⚠️ 发现差异", ctx),
                    _ => info!("{} ✓ 数据一致", ctx),
                }
                PairOutcome::new(pair, status, response, ctx.order_index)
            }
            Err(e) => {
                warn!("{} ❌ 校验失败: {}", ctx, e);
                PairOutcome::new(
                    pair,
                    OutcomeStatus::Error,
                    format!("❌ Error processing: {}", e),
                    ctx.order_index,
                )
            }
        }
    }

    /// 取消后到达的配对，不调用 Oracle
    pub fn cancelled(pair: Pair, ctx: &PairCtx) -> PairOutcome {
        warn!("{} ⏹ 已取消，跳过校验", ctx);
        PairOutcome::new(
            pair,
            OutcomeStatus::Error,
            "❌ Cancelled before verification",
            ctx.order_index,
        )
    }

    async fn verify_with_retry(&self, pair: &Pair, ctx: &PairCtx) -> Result<String, OracleError> {
        let mut attempt = 0;
        loop {
            match self.verification.verify(pair).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let wait = match &e {
                        OracleError::RateLimited {
                            retry_after: Some(secs),
                            ..
                        } => Duration::from_secs(*secs).max(self.retry.backoff),
                        _ => self.retry.backoff,
                    };
                    warn!(
                        "{} 调用失败 ({})，{:?} 后重试 {}/{}",
                        ctx, e, wait, attempt, self.retry.max_retries
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{OracleRequest, VerificationOracle};
    use crate::models::{FileHandle, FileKind, MatchKey};
    use crate::services::PromptTemplate;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// 依次返回预设的结果
    struct ScriptedOracle {
        script: Mutex<Vec<Result<String, OracleError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedOracle {
        fn new(mut script: Vec<Result<String, OracleError>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl VerificationOracle for ScriptedOracle {
        fn provider(&self) -> &str {
            "scripted"
        }

        async fn verify(&self, _request: &OracleRequest) -> Result<String, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop();
            next.unwrap_or_else(|| Ok("MATCH".to_string()))
        }
    }

    fn flow(oracle: Arc<ScriptedOracle>, max_retries: u32) -> PairFlow {
        PairFlow::new(
            VerificationService::new(oracle, PromptTemplate::default()),
            RetryPolicy {
                max_retries,
                backoff: Duration::from_millis(1),
            },
        )
    }

    fn sample_pair() -> Pair {
        Pair::new(
            MatchKey::new("a"),
            FileHandle::from_bytes("a.pdf", FileKind::Document, b"%PDF".to_vec()),
            FileHandle::from_bytes("a.csv", FileKind::Reference, b"x".to_vec()),
        )
    }

    fn timeout() -> OracleError {
        OracleError::request_failed("scripted", "timeout")
    }

    #[tokio::test]
    async fn test_success_is_classified() {
        let oracle = Arc::new(ScriptedOracle::new(vec![Ok(
            "**Status:** DISCREPANCY FOUND".to_string()
        )]));
        let ctx = PairCtx::new(3, 5, "a.pdf");

        let outcome = flow(oracle, 0).run(sample_pair(), &ctx).await;

        assert_eq!(outcome.status(), OutcomeStatus::Discrepancy);
        assert_eq!(outcome.detail(), "**Status:** DISCREPANCY FOUND");
        assert_eq!(outcome.order_index(), 3);
    }

    #[tokio::test]
    async fn test_failure_becomes_error_outcome() {
        let oracle = Arc::new(ScriptedOracle::new(vec![Err(timeout())]));
        let ctx = PairCtx::new(0, 1, "a.pdf");

        let outcome = flow(oracle.clone(), 0).run(sample_pair(), &ctx).await;

        assert_eq!(outcome.status(), OutcomeStatus::Error);
        assert!(outcome.detail().starts_with("❌ Error processing:"));
        assert!(outcome.detail().contains("timeout"));
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retryable_error_is_retried() {
        let oracle = Arc::new(ScriptedOracle::new(vec![
            Err(timeout()),
            Ok("**Status:** MATCH".to_string()),
        ]));
        let ctx = PairCtx::new(0, 1, "a.pdf");

        let outcome = flow(oracle.clone(), 2).run(sample_pair(), &ctx).await;

        assert_eq!(outcome.status(), OutcomeStatus::Match);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_error_is_not_retried() {
        let oracle = Arc::new(ScriptedOracle::new(vec![Err(OracleError::from_status(
            "scripted", 401, None, "",
        ))]));
        let ctx = PairCtx::new(0, 1, "a.pdf");

        let outcome = flow(oracle.clone(), 3).run(sample_pair(), &ctx).await;

        assert_eq!(outcome.status(), OutcomeStatus::Error);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let oracle = Arc::new(ScriptedOracle::new(vec![
            Err(timeout()),
            Err(timeout()),
            Err(timeout()),
        ]));
        let ctx = PairCtx::new(0, 1, "a.pdf");

        let outcome = flow(oracle.clone(), 1).run(sample_pair(), &ctx).await;

        assert_eq!(outcome.status(), OutcomeStatus::Error);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cancelled_outcome() {
        let ctx = PairCtx::new(2, 4, "a.pdf");
        let outcome = PairFlow::cancelled(sample_pair(), &ctx);

        assert_eq!(outcome.status(), OutcomeStatus::Error);
        assert_eq!(outcome.order_index(), 2);
        assert_eq!(ctx.to_string(), "[配对 3/4 a.pdf]");
    }
}
