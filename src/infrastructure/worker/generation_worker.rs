//! Generation Worker - 后台生成任务处理器
//!
//! 消费提交处理器投递的任务队列：
//! - Synthesis: 调 TTS 网关合成，经产物定稿器完成记录；
//! - RenderWatch: 为渲染任务启动轮询循环。
//!
//! 所有失败在任务内部捕获并写回记录状态，绝不让进程退出。

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::ports::{
    ContentPatch, ContentStorePort, GenerationJob, SynthesisJob, TtsEnginePort,
};

use super::materializer::ResultMaterializer;
use super::poll_worker::PollWorker;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct GenerationWorkerConfig {
    /// 最大并发合成数
    pub max_concurrent: usize,
}

impl Default for GenerationWorkerConfig {
    fn default() -> Self {
        Self { max_concurrent: 2 }
    }
}

/// 生成 Worker
pub struct GenerationWorker {
    config: GenerationWorkerConfig,
    queue_receiver: mpsc::Receiver<GenerationJob>,
    tts_engine: Arc<dyn TtsEnginePort>,
    store: Arc<dyn ContentStorePort>,
    materializer: Arc<ResultMaterializer>,
    poll_worker: Arc<PollWorker>,
}

impl GenerationWorker {
    pub fn new(
        config: GenerationWorkerConfig,
        queue_receiver: mpsc::Receiver<GenerationJob>,
        tts_engine: Arc<dyn TtsEnginePort>,
        store: Arc<dyn ContentStorePort>,
        materializer: Arc<ResultMaterializer>,
        poll_worker: Arc<PollWorker>,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            tts_engine,
            store,
            materializer,
            poll_worker,
        }
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            "GenerationWorker started"
        );

        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.max_concurrent));

        while let Some(job) = self.queue_receiver.recv().await {
            match job {
                GenerationJob::Synthesis(job) => {
                    let permit = match semaphore.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            tracing::error!("Failed to acquire semaphore permit");
                            continue;
                        }
                    };

                    let tts_engine = self.tts_engine.clone();
                    let store = self.store.clone();
                    let materializer = self.materializer.clone();

                    tokio::spawn(async move {
                        let _permit = permit; // 持有 permit 直到任务完成
                        Self::process_synthesis(job, tts_engine, store, materializer).await;
                    });
                }
                GenerationJob::RenderWatch {
                    record_id,
                    task_code,
                } => {
                    // 轮询循环自带在途注册表，这里直接派发
                    self.poll_worker.clone().spawn(record_id, task_code);
                }
            }
        }

        tracing::info!("GenerationWorker stopped");
    }

    /// 处理单次合成任务
    async fn process_synthesis(
        job: SynthesisJob,
        tts_engine: Arc<dyn TtsEnginePort>,
        store: Arc<dyn ContentStorePort>,
        materializer: Arc<ResultMaterializer>,
    ) {
        let record_id = job.record_id;

        // 记录可能已被用户删除
        match store.get(record_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(record_id = %record_id, "Record not found, skipping synthesis");
                return;
            }
            Err(e) => {
                tracing::error!(record_id = %record_id, error = %e, "Failed to read record");
                return;
            }
        }

        let audio = match tts_engine.synthesize(job.request).await {
            Ok(audio) => audio,
            Err(e) => {
                tracing::error!(record_id = %record_id, error = %e, "TTS synthesis failed");
                if let Err(e) = store
                    .update(record_id, ContentPatch::failed(format!("TTS error: {}", e)))
                    .await
                {
                    tracing::error!(record_id = %record_id, error = %e, "Failed to mark record failed");
                }
                return;
            }
        };

        if let Err(e) = materializer.finalize_audio(record_id, &audio).await {
            // 定稿器已把记录改判 failed，这里只记日志
            tracing::error!(record_id = %record_id, error = %e, "Audio materialization failed");
            return;
        }

        tracing::info!(record_id = %record_id, "Synthesis job completed");
    }
}
