//! Generate Command Handlers - 任务提交协调
//!
//! 提交协调器的两条路径：
//! - 语音：建记录后任务入队，立即返回 record_id；
//! - 视频：先行校验模型引用（无效则不建记录直接报错），
//!   内联准备配音并提交渲染服务；提供方拒绝时同步把记录
//!   判失败但仍返回 success-with-id（任务存在，只是立即失败，
//!   保留提供方背压语义）；传输失败时记录留在 generating，
//!   交给轮询引擎在首轮发现真相。

use serde_json::Value;
use std::sync::Arc;

use crate::application::commands::content_commands::{
    RenderOptions, SubmitAudioCommand, SubmitContentResponse, SubmitVideoCommand,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    companion_audio_name, ContentPatch, ContentStorePort, GenerationJob, JobSchedulerPort,
    MediaStoragePort, ModelRepositoryPort, RenderEnginePort, RenderSubmission, SynthesisJob,
    SynthesizeRequest, TtsEnginePort,
};
use crate::domain::{ContentRecord, ContentStatus};

/// 构造 TTS 请求：voice_config 为空时退化为 {"voice": tts_model}
fn build_voice_config(voice_config: &Value, tts_model: &str) -> Value {
    if !voice_config.is_null() {
        return voice_config.clone();
    }
    if tts_model.is_empty() {
        return Value::Null;
    }
    serde_json::json!({ "voice": tts_model })
}

/// SubmitAudio Handler - 语音生成提交
pub struct SubmitAudioHandler {
    store: Arc<dyn ContentStorePort>,
    scheduler: Arc<dyn JobSchedulerPort>,
}

impl SubmitAudioHandler {
    pub fn new(store: Arc<dyn ContentStorePort>, scheduler: Arc<dyn JobSchedulerPort>) -> Self {
        Self { store, scheduler }
    }

    pub async fn handle(
        &self,
        cmd: SubmitAudioCommand,
    ) -> Result<SubmitContentResponse, ApplicationError> {
        if cmd.input_text.trim().is_empty() {
            return Err(ApplicationError::validation("Input text cannot be empty"));
        }

        let record = ContentRecord::new_audio(
            cmd.input_text.clone(),
            cmd.provider.clone(),
            cmd.tts_model.clone(),
        );
        let record_id = record.id;
        self.store.insert(record).await?;

        let request = SynthesizeRequest {
            text: cmd.input_text,
            service: cmd.provider,
            voice_config: build_voice_config(&cmd.voice_config, &cmd.tts_model),
            format: "wav".to_string(),
            language: cmd.language,
        };

        let status = match self
            .scheduler
            .enqueue(GenerationJob::Synthesis(SynthesisJob { record_id, request }))
        {
            Ok(()) => ContentStatus::Generating,
            Err(e) => {
                // 队列不可用等价于提供方背压：同步判失败，任务仍算创建成功
                tracing::warn!(record_id = %record_id, error = %e, "Failed to enqueue synthesis job");
                self.store
                    .update(
                        record_id,
                        ContentPatch::failed(format!("Failed to queue synthesis: {}", e)),
                    )
                    .await?;
                ContentStatus::Failed
            }
        };

        tracing::info!(record_id = %record_id, status = status.as_str(), "Audio job submitted");

        Ok(SubmitContentResponse {
            record_id,
            task_code: None,
            status,
        })
    }
}

/// SubmitVideo Handler - 视频生成提交
pub struct SubmitVideoHandler {
    store: Arc<dyn ContentStorePort>,
    model_repo: Arc<dyn ModelRepositoryPort>,
    tts_engine: Arc<dyn TtsEnginePort>,
    render_engine: Arc<dyn RenderEnginePort>,
    media: Arc<dyn MediaStoragePort>,
    scheduler: Arc<dyn JobSchedulerPort>,
    default_options: RenderOptions,
}

impl SubmitVideoHandler {
    pub fn new(
        store: Arc<dyn ContentStorePort>,
        model_repo: Arc<dyn ModelRepositoryPort>,
        tts_engine: Arc<dyn TtsEnginePort>,
        render_engine: Arc<dyn RenderEnginePort>,
        media: Arc<dyn MediaStoragePort>,
        scheduler: Arc<dyn JobSchedulerPort>,
        default_options: RenderOptions,
    ) -> Self {
        Self {
            store,
            model_repo,
            tts_engine,
            render_engine,
            media,
            scheduler,
            default_options,
        }
    }

    pub async fn handle(
        &self,
        cmd: SubmitVideoCommand,
    ) -> Result<SubmitContentResponse, ApplicationError> {
        // 快速失败：模型引用无效不创建任何记录
        let model = self
            .model_repo
            .find_by_id(cmd.model_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::validation(format!("Model not found: {}", cmd.model_id))
            })?;
        let video_url = model
            .primary_training_file()
            .ok_or_else(|| {
                ApplicationError::validation(format!("Model {} has no training files", model.id))
            })?
            .to_string();

        if cmd.input_text.trim().is_empty() && cmd.reference_audio.is_none() {
            return Err(ApplicationError::validation(
                "Either input text or reference audio is required",
            ));
        }

        let mut record = ContentRecord::new_video(
            cmd.input_text.clone(),
            cmd.provider.clone(),
            cmd.tts_model.clone(),
            model.id,
        );
        let task_code = record.allocate_task_code();
        let record_id = record.id;
        self.store.insert(record).await?;

        // 准备配音：有参考音频直接用，否则内联合成一次
        let audio_url = match cmd.reference_audio {
            Some(reference) => reference,
            None => {
                let request = SynthesizeRequest {
                    text: cmd.input_text,
                    service: cmd.provider,
                    voice_config: build_voice_config(&cmd.voice_config, &cmd.tts_model),
                    format: "wav".to_string(),
                    language: cmd.language,
                };
                match self.tts_engine.synthesize(request).await {
                    Ok(audio) => {
                        let temp_name = companion_audio_name(record_id);
                        match self.media.save_audio(&temp_name, &audio.audio_data).await {
                            Ok(path) => path.to_string_lossy().to_string(),
                            Err(e) => {
                                return self
                                    .fail_submitted(
                                        record_id,
                                        task_code,
                                        format!("Failed to store driving audio: {}", e),
                                    )
                                    .await;
                            }
                        }
                    }
                    Err(e) => {
                        return self
                            .fail_submitted(record_id, task_code, format!("TTS error: {}", e))
                            .await;
                    }
                }
            }
        };

        let options = cmd.options.unwrap_or_else(|| self.default_options.clone());
        let submission = RenderSubmission {
            audio_url,
            video_url,
            code: task_code.clone(),
            chaofen: options.chaofen,
            watermark_switch: options.watermark_switch,
            pn: options.pn,
        };

        let status = match self.render_engine.submit(submission).await {
            Ok(reply) if reply.accepted() => self.watch(record_id, &task_code).await?,
            Ok(reply) => {
                // 提供方级拒绝（busy / invalid）：同步判失败，不自动重试
                tracing::warn!(
                    record_id = %record_id,
                    task_code = %task_code,
                    reply_code = reply.code,
                    "Render submit rejected by provider"
                );
                self.store
                    .update(
                        record_id,
                        ContentPatch::failed(format!(
                            "Render submit rejected ({}): {}",
                            reply.code, reply.message
                        )),
                    )
                    .await?;
                ContentStatus::Failed
            }
            Err(e) => {
                // 传输失败：任务可能已被提供方接收，留在 generating，
                // 由轮询引擎在首轮查询中发现实情
                tracing::warn!(
                    record_id = %record_id,
                    task_code = %task_code,
                    error = %e,
                    "Render submit transport error, deferring to poll loop"
                );
                self.watch(record_id, &task_code).await?
            }
        };

        tracing::info!(
            record_id = %record_id,
            task_code = %task_code,
            status = status.as_str(),
            "Video job submitted"
        );

        Ok(SubmitContentResponse {
            record_id,
            task_code: Some(task_code),
            status,
        })
    }

    /// 把任务交给轮询引擎；队列不可用时判失败
    async fn watch(
        &self,
        record_id: uuid::Uuid,
        task_code: &str,
    ) -> Result<ContentStatus, ApplicationError> {
        match self.scheduler.enqueue(GenerationJob::RenderWatch {
            record_id,
            task_code: task_code.to_string(),
        }) {
            Ok(()) => Ok(ContentStatus::Generating),
            Err(e) => {
                tracing::warn!(record_id = %record_id, error = %e, "Failed to enqueue render watch");
                self.store
                    .update(
                        record_id,
                        ContentPatch::failed(format!("Failed to queue polling: {}", e)),
                    )
                    .await?;
                Ok(ContentStatus::Failed)
            }
        }
    }

    async fn fail_submitted(
        &self,
        record_id: uuid::Uuid,
        task_code: String,
        message: String,
    ) -> Result<SubmitContentResponse, ApplicationError> {
        tracing::warn!(record_id = %record_id, error = %message, "Video job failed before render submit");
        self.store
            .update(record_id, ContentPatch::failed(message))
            .await?;
        Ok(SubmitContentResponse {
            record_id,
            task_code: Some(task_code),
            status: ContentStatus::Failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssetType, ModelAsset};
    use crate::infrastructure::adapters::render::{complete, in_progress, FakeRenderClient};
    use crate::infrastructure::adapters::{
        ArtifactLocator, FakeTtsClient, FileMediaStorage, FixedProbe,
    };
    use crate::infrastructure::persistence::{JsonContentStore, JsonModelRepository};
    use crate::infrastructure::worker::{
        ChannelJobScheduler, GenerationWorker, GenerationWorkerConfig, PollConfig, PollWorker,
        ResultMaterializer,
    };
    use crate::application::ports::CODE_BUSY;
    use chrono::Utc;
    use std::time::Duration;
    use tempfile::TempDir;
    use uuid::Uuid;

    struct Fixture {
        _dir: TempDir,
        data_dir: std::path::PathBuf,
        store: Arc<JsonContentStore>,
        model_repo: Arc<JsonModelRepository>,
        media: Arc<FileMediaStorage>,
        scheduler: Arc<ChannelJobScheduler>,
    }

    /// 搭建完整后台：调度队列 + 生成 Worker + 轮询
    async fn fixture(tts: Arc<FakeTtsClient>, render: Arc<FakeRenderClient>) -> Fixture {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().to_path_buf();

        let store = Arc::new(
            JsonContentStore::open(data_dir.join("database/contents.json"))
                .await
                .unwrap(),
        );
        let model_repo = Arc::new(
            JsonModelRepository::open(data_dir.join("database/models.json"))
                .await
                .unwrap(),
        );
        let media = Arc::new(
            FileMediaStorage::new(data_dir.join("audios"), data_dir.join("videos"))
                .await
                .unwrap(),
        );
        let locator = Arc::new(ArtifactLocator::new(
            &data_dir,
            vec!["videos".to_string(), "temp".to_string()],
            vec!["audios".to_string()],
        ));
        let materializer = Arc::new(ResultMaterializer::new(
            store.clone(),
            media.clone(),
            locator,
            Arc::new(FixedProbe(Some(6))),
        ));
        let poll_worker = Arc::new(PollWorker::new(
            PollConfig {
                initial_delay: Duration::from_millis(50),
                poll_interval: Duration::from_millis(5),
                not_found_interval: Duration::from_millis(5),
                max_retries: 10,
            },
            render,
            store.clone(),
            materializer.clone(),
        ));

        let (scheduler, receiver) = ChannelJobScheduler::new(64);
        let worker = GenerationWorker::new(
            GenerationWorkerConfig::default(),
            receiver,
            tts,
            store.clone(),
            materializer,
            poll_worker,
        );
        tokio::spawn(worker.run());

        Fixture {
            _dir: dir,
            data_dir,
            store,
            model_repo,
            media,
            scheduler: Arc::new(scheduler),
        }
    }

    async fn seed_model(repo: &JsonModelRepository) -> Uuid {
        let asset = ModelAsset {
            id: Uuid::new_v4(),
            name: "主播形象".to_string(),
            asset_type: AssetType::Character,
            provider: "face2face".to_string(),
            language: "zh-TW".to_string(),
            voice_settings: None,
            training_files: vec!["anchor.mp4".to_string()],
            status: "ready".to_string(),
            created_at: Utc::now(),
        };
        let id = asset.id;
        repo.save(&asset).await.unwrap();
        id
    }

    fn video_handler(fx: &Fixture, tts: Arc<FakeTtsClient>, render: Arc<FakeRenderClient>) -> SubmitVideoHandler {
        SubmitVideoHandler::new(
            fx.store.clone(),
            fx.model_repo.clone(),
            tts,
            render,
            fx.media.clone(),
            fx.scheduler.clone(),
            RenderOptions::default(),
        )
    }

    async fn wait_terminal(store: &JsonContentStore, id: Uuid) -> ContentRecord {
        for _ in 0..400 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let record = store.get(id).await.unwrap().unwrap();
            if record.status.is_terminal() {
                return record;
            }
        }
        panic!("record never reached a terminal state");
    }

    #[tokio::test]
    async fn test_submit_audio_creates_single_generating_record() {
        let tts = Arc::new(FakeTtsClient::with_defaults());
        let render = Arc::new(FakeRenderClient::accepting(vec![]));
        let fx = fixture(tts, render).await;

        let handler = SubmitAudioHandler::new(fx.store.clone(), fx.scheduler.clone());
        let response = handler
            .handle(SubmitAudioCommand::new("你好世界", "edgetts"))
            .await
            .unwrap();

        assert_eq!(response.status, ContentStatus::Generating);
        assert!(response.task_code.is_none());
        let all = fx.store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, response.record_id);
    }

    #[tokio::test]
    async fn test_submit_audio_end_to_end_completes() {
        let tts = Arc::new(FakeTtsClient::with_defaults());
        let render = Arc::new(FakeRenderClient::accepting(vec![]));
        let fx = fixture(tts, render).await;

        let handler = SubmitAudioHandler::new(fx.store.clone(), fx.scheduler.clone());
        let response = handler
            .handle(SubmitAudioCommand::new("Hello", "edgetts"))
            .await
            .unwrap();

        let record = wait_terminal(&fx.store, response.record_id).await;
        assert_eq!(record.status, ContentStatus::Completed);
        let output_path = record.output_path.unwrap();
        assert!(output_path.starts_with("/audios/"));
        assert!(record.duration.unwrap() > 0);

        // 产物确实落盘
        let file = fx
            .data_dir
            .join("audios")
            .join(output_path.trim_start_matches("/audios/"));
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_submit_audio_empty_text_rejected_without_record() {
        let tts = Arc::new(FakeTtsClient::with_defaults());
        let render = Arc::new(FakeRenderClient::accepting(vec![]));
        let fx = fixture(tts, render).await;

        let handler = SubmitAudioHandler::new(fx.store.clone(), fx.scheduler.clone());
        let err = handler.handle(SubmitAudioCommand::new("   ", "edgetts")).await;

        assert!(matches!(err, Err(ApplicationError::ValidationError(_))));
        assert!(fx.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tts_failure_marks_record_failed() {
        let tts = Arc::new(FakeTtsClient::failing("synth backend down"));
        let render = Arc::new(FakeRenderClient::accepting(vec![]));
        let fx = fixture(tts, render).await;

        let handler = SubmitAudioHandler::new(fx.store.clone(), fx.scheduler.clone());
        let response = handler
            .handle(SubmitAudioCommand::new("你好", "edgetts"))
            .await
            .unwrap();

        let record = wait_terminal(&fx.store, response.record_id).await;
        assert_eq!(record.status, ContentStatus::Failed);
        assert!(record.error_message.unwrap().contains("synth backend down"));
    }

    #[tokio::test]
    async fn test_submit_video_without_model_creates_no_record() {
        let tts = Arc::new(FakeTtsClient::with_defaults());
        let render = Arc::new(FakeRenderClient::accepting(vec![]));
        let fx = fixture(tts.clone(), render.clone()).await;

        let handler = video_handler(&fx, tts, render);
        let err = handler
            .handle(SubmitVideoCommand::new("你好", "edgetts", Uuid::new_v4()))
            .await;

        assert!(matches!(err, Err(ApplicationError::ValidationError(_))));
        assert!(fx.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_video_end_to_end_completes() {
        let tts = Arc::new(FakeTtsClient::with_defaults());
        let render = Arc::new(FakeRenderClient::accepting(vec![
            in_progress(40),
            complete("by-locator"),
        ]));
        let fx = fixture(tts.clone(), render.clone()).await;

        let model_id = seed_model(&fx.model_repo).await;
        let handler = video_handler(&fx, tts, render);
        let response = handler
            .handle(SubmitVideoCommand::new("你好", "edgetts", model_id))
            .await
            .unwrap();

        assert_eq!(response.status, ContentStatus::Generating);
        let task_code = response.task_code.clone().unwrap();

        // 初始延迟窗口内预置提供方产物
        tokio::fs::write(
            fx.data_dir.join("videos").join(format!("{}-r.mp4", task_code)),
            b"mp4",
        )
        .await
        .unwrap();

        let record = wait_terminal(&fx.store, response.record_id).await;
        assert_eq!(record.status, ContentStatus::Completed);
        assert_eq!(
            record.output_path.as_deref(),
            Some(&format!("/videos/video_{}.mp4", response.record_id)[..])
        );
        // 配音临时音频已转正
        assert_eq!(
            record.audio_path.as_deref(),
            Some(&format!("/audios/audio_{}.wav", response.record_id)[..])
        );
    }

    #[tokio::test]
    async fn test_submit_video_provider_rejection_fails_synchronously() {
        let tts = Arc::new(FakeTtsClient::with_defaults());
        let render = Arc::new(FakeRenderClient::rejecting(CODE_BUSY, "server busy"));
        let fx = fixture(tts.clone(), render.clone()).await;

        let model_id = seed_model(&fx.model_repo).await;
        let handler = video_handler(&fx, tts, render);
        let response = handler
            .handle(SubmitVideoCommand::new("你好", "edgetts", model_id))
            .await
            .unwrap();

        // 任务存在但已同步失败
        assert_eq!(response.status, ContentStatus::Failed);
        let record = fx.store.get(response.record_id).await.unwrap().unwrap();
        assert_eq!(record.status, ContentStatus::Failed);
        assert!(record.error_message.unwrap().contains("server busy"));
    }
}
