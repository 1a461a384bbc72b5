//! Worker - 后台任务处理
//!
//! - GenerationWorker: 消费生成队列（合成 / 轮询派发）
//! - PollWorker: 渲染任务状态轮询
//! - ResultMaterializer: 产物落库定稿
//! - RetentionSweeper: 内容保留清理
//! - StartupRecovery: 启动恢复

mod generation_worker;
mod materializer;
mod poll_worker;
mod recovery;
mod scheduler;
mod sweeper;

pub use generation_worker::{GenerationWorker, GenerationWorkerConfig};
pub use materializer::{MaterializeError, ResultMaterializer};
pub use poll_worker::{PollConfig, PollWorker};
pub use recovery::{RecoveryReport, StartupRecovery};
pub use scheduler::ChannelJobScheduler;
pub use sweeper::RetentionSweeper;
