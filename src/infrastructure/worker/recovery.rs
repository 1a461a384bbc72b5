//! Startup Recovery - 启动恢复
//!
//! 进程重启后把存储里的记录修复到一致状态：
//! - 在途视频任务（有关联码）重新接上轮询循环；
//! - 没有关联码的非终态记录（队列随进程一起丢了）改判 failed；
//! - 已完成但产物文件已消失的记录改判 failed（明确策略，
//!   不做静默忽略），同时清掉失效的产物路径。

use std::sync::Arc;

use crate::application::ports::{ContentPatch, ContentStorePort, MediaStoragePort, StoreError};
use crate::domain::{ContentStatus, ContentType};

use super::poll_worker::PollWorker;

/// 恢复结果统计
#[derive(Debug, Default)]
pub struct RecoveryReport {
    /// 重新接上轮询的任务数
    pub resumed_polls: usize,
    /// 改判失败的中断任务数
    pub failed_interrupted: usize,
    /// 产物丢失而改判失败的记录数
    pub failed_missing_artifact: usize,
}

/// 启动恢复
pub struct StartupRecovery {
    store: Arc<dyn ContentStorePort>,
    media: Arc<dyn MediaStoragePort>,
    poll_worker: Arc<PollWorker>,
}

impl StartupRecovery {
    pub fn new(
        store: Arc<dyn ContentStorePort>,
        media: Arc<dyn MediaStoragePort>,
        poll_worker: Arc<PollWorker>,
    ) -> Self {
        Self {
            store,
            media,
            poll_worker,
        }
    }

    /// 执行一次恢复
    pub async fn run(&self) -> Result<RecoveryReport, StoreError> {
        let mut report = RecoveryReport::default();

        for record in self.store.list().await? {
            match record.status {
                ContentStatus::Completed => {
                    let artifact_present = record
                        .output_path
                        .as_deref()
                        .and_then(|p| self.media.resolve_public_path(p))
                        .map(|p| p.is_file())
                        .unwrap_or(false);

                    if !artifact_present {
                        tracing::warn!(
                            record_id = %record.id,
                            output_path = ?record.output_path,
                            "Completed record lost its artifact, marking failed"
                        );
                        let mut patch = ContentPatch::failed("Artifact file missing");
                        patch.force_status = true;
                        self.store.update(record.id, patch).await?;
                        report.failed_missing_artifact += 1;
                    }
                }
                ContentStatus::Generating | ContentStatus::Processing => {
                    let resumable = record.content_type == ContentType::Video
                        && record.task_code.is_some();

                    if resumable {
                        let task_code = record.task_code.clone().unwrap_or_default();
                        tracing::info!(
                            record_id = %record.id,
                            task_code = %task_code,
                            "Resuming poll loop for in-flight render task"
                        );
                        self.poll_worker.clone().spawn(record.id, task_code);
                        report.resumed_polls += 1;
                    } else {
                        // 合成队列随上个进程一起消失，任务无法续作
                        self.store
                            .update(
                                record.id,
                                ContentPatch::failed("Interrupted by service restart"),
                            )
                            .await?;
                        report.failed_interrupted += 1;
                    }
                }
                ContentStatus::Failed => {}
            }
        }

        tracing::info!(
            resumed_polls = report.resumed_polls,
            failed_interrupted = report.failed_interrupted,
            failed_missing_artifact = report.failed_missing_artifact,
            "Startup recovery finished"
        );
        Ok(report)
    }
}
