//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 加载两组文件并配对
//! - 汇总结果、写报告、输出全局统计信息
//!
//! ### `batch_runner` - 批量执行器
//! - 逐对调用 `PairFlow`，失败互不影响
//! - 控制并发数量（Semaphore）和取消
//! - 上报进度
//!
//! ### `confirmation` - 未配对确认
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<FileHandle>)
//!     ↓
//! batch_runner (处理 Vec<Pair>)
//!     ↓
//! workflow::PairFlow (处理单个 Pair)
//!     ↓
//! services (能力层：matching / verification / aggregator)
//!     ↓
//! clients (Oracle 适配层)
//! ```

pub mod batch_processor;
pub mod batch_runner;
pub mod confirmation;

// 重新导出主要类型
pub use batch_processor::{App, RunReport};
pub use batch_runner::{BatchRunner, CancellationFlag, Progress};
pub use confirmation::confirm_unmatched;
