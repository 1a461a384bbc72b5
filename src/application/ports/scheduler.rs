//! Job Scheduler Port - 后台任务派发
//!
//! 提交处理器把任务投递到队列后立即返回；
//! 队列由 infrastructure/worker 的生成 Worker 消费。

use thiserror::Error;
use uuid::Uuid;

use super::tts_engine::SynthesizeRequest;

/// 调度错误
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Job queue is full")]
    QueueFull,

    #[error("Job queue is closed")]
    Closed,
}

/// 语音合成任务
#[derive(Debug, Clone)]
pub struct SynthesisJob {
    pub record_id: Uuid,
    pub request: SynthesizeRequest,
}

/// 后台生成任务
#[derive(Debug, Clone)]
pub enum GenerationJob {
    /// 单次 TTS 合成 + 落库
    Synthesis(SynthesisJob),
    /// 渲染任务轮询直至终态
    RenderWatch { record_id: Uuid, task_code: String },
}

/// Job Scheduler Port
pub trait JobSchedulerPort: Send + Sync {
    /// 投递任务（非阻塞）
    fn enqueue(&self, job: GenerationJob) -> Result<(), SchedulerError>;
}
