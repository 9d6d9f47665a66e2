//! 批量校验执行器 - 编排层
//!
//! ## 职责
//!
//! 按配对顺序逐一校验，单对失败不影响其余配对。
//!
//! ## 执行模式
//!
//! 1. **串行**（默认，`max_concurrent == 1`）：一次只有一个 Oracle 请求在途
//! 2. **有界并发**：Semaphore 限制在途请求数，结果按完成顺序到达，
//!    最后按 `order_index` 重新排序
//!
//! 每对校验前检查取消标记；取消后到达的配对记为 Error，不调用 Oracle，
//! 保证结果序列始终覆盖全部配对。

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::error;

use crate::models::{OutcomeStatus, Pair, PairOutcome};
use crate::workflow::{PairCtx, PairFlow};

/// 协作式取消标记
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 进度通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// 已完成数量，从 1 严格递增到 total
    pub completed: usize,
    pub total: usize,
    /// 刚完成的 PDF 文件名
    pub current_name: String,
}

/// 批量校验执行器
pub struct BatchRunner {
    flow: Arc<PairFlow>,
    max_concurrent: usize,
    cancel: CancellationFlag,
}

impl BatchRunner {
    pub fn new(flow: PairFlow, max_concurrent: usize) -> Self {
        Self {
            flow: Arc::new(flow),
            max_concurrent: max_concurrent.max(1),
            cancel: CancellationFlag::new(),
        }
    }

    /// 使用外部提供的取消标记
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// 校验全部配对，处理完所有配对后才返回
    ///
    /// 返回的结果与输入一一对应，并按输入顺序排列。
    pub async fn run<F>(&self, pairs: Vec<Pair>, on_progress: F) -> Vec<PairOutcome>
    where
        F: FnMut(Progress),
    {
        if self.max_concurrent == 1 {
            self.run_sequential(pairs, on_progress).await
        } else {
            self.run_pooled(pairs, on_progress).await
        }
    }

    async fn run_sequential<F>(&self, pairs: Vec<Pair>, mut on_progress: F) -> Vec<PairOutcome>
    where
        F: FnMut(Progress),
    {
        let total = pairs.len();
        let mut outcomes = Vec::with_capacity(total);

        for (order_index, pair) in pairs.into_iter().enumerate() {
            let ctx = PairCtx::new(order_index, total, pair.document_name());

            let outcome = if self.cancel.is_cancelled() {
                PairFlow::cancelled(pair, &ctx)
            } else {
                self.flow.run(pair, &ctx).await
            };

            outcomes.push(outcome);
            on_progress(Progress {
                completed: outcomes.len(),
                total,
                current_name: ctx.document_name,
            });
        }

        outcomes
    }

    async fn run_pooled<F>(&self, pairs: Vec<Pair>, mut on_progress: F) -> Vec<PairOutcome>
    where
        F: FnMut(Progress),
    {
        let total = pairs.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut in_flight = FuturesUnordered::new();

        for (order_index, pair) in pairs.into_iter().enumerate() {
            let ctx = PairCtx::new(order_index, total, pair.document_name());
            let fallback = (pair.clone(), ctx.clone());
            let flow = Arc::clone(&self.flow);
            let cancel = self.cancel.clone();
            let semaphore = Arc::clone(&semaphore);

            let handle = tokio::spawn(async move {
                // Semaphore 不会被关闭，acquire 只会等待
                let _permit = semaphore.acquire_owned().await;
                if cancel.is_cancelled() {
                    PairFlow::cancelled(pair, &ctx)
                } else {
                    flow.run(pair, &ctx).await
                }
            });

            in_flight.push(async move { (fallback, handle.await) });
        }

        let mut outcomes = Vec::with_capacity(total);

        while let Some(((pair, ctx), joined)) = in_flight.next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("{} 任务执行失败: {}", ctx, e);
                    PairOutcome::new(
                        pair,
                        OutcomeStatus::Error,
                        format!("❌ Error processing: task failed: {}", e),
                        ctx.order_index,
                    )
                }
            };

            outcomes.push(outcome);
            on_progress(Progress {
                completed: outcomes.len(),
                total,
                current_name: ctx.document_name,
            });
        }

        outcomes.sort_by_key(|o| o.order_index());
        outcomes
    }
}
