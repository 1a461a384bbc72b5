//! Channel Job Scheduler - 基于 mpsc 队列的任务派发
//!
//! 提交处理器持有发送端（JobSchedulerPort），
//! GenerationWorker 持有接收端消费任务。

use tokio::sync::mpsc;

use crate::application::ports::{GenerationJob, JobSchedulerPort, SchedulerError};

/// mpsc 任务调度器
pub struct ChannelJobScheduler {
    queue_sender: mpsc::Sender<GenerationJob>,
}

impl ChannelJobScheduler {
    /// 创建调度器与配套的接收端
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<GenerationJob>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { queue_sender: tx }, rx)
    }
}

impl JobSchedulerPort for ChannelJobScheduler {
    fn enqueue(&self, job: GenerationJob) -> Result<(), SchedulerError> {
        self.queue_sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SchedulerError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SchedulerError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{SynthesisJob, SynthesizeRequest};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_enqueue_and_receive() {
        let (scheduler, mut rx) = ChannelJobScheduler::new(8);

        let record_id = Uuid::new_v4();
        scheduler
            .enqueue(GenerationJob::Synthesis(SynthesisJob {
                record_id,
                request: SynthesizeRequest::new("你好", "edgetts"),
            }))
            .unwrap();

        match rx.recv().await.unwrap() {
            GenerationJob::Synthesis(job) => assert_eq!(job.record_id, record_id),
            other => panic!("unexpected job: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_enqueue_full_queue() {
        let (scheduler, _rx) = ChannelJobScheduler::new(1);

        let job = || {
            GenerationJob::RenderWatch {
                record_id: Uuid::new_v4(),
                task_code: "task_x".to_string(),
            }
        };
        scheduler.enqueue(job()).unwrap();
        assert!(matches!(
            scheduler.enqueue(job()),
            Err(SchedulerError::QueueFull)
        ));
    }
}
