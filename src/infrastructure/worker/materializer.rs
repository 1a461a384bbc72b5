//! Result Materializer - 产物落库定稿
//!
//! 任务成功后把提供方产出的文件搬进规范目录并定稿记录：
//! - 渲染任务：按关联码在候选目录中定位产物，复制为
//!   video_{record_id}.mp4（公开路径与提供方命名解耦），
//!   顺带把配音临时音频转正为 audio_{record_id}.wav；
//! - 语音任务：网关返回的字节直接写成 audio_{record_id}.wav。
//!
//! 时长探测尽力而为，失败回退默认值，绝不阻塞定稿。
//! 提供方报成功但找不到产物是硬失败：记录改判 failed，
//! 不允许停留在 processing。

use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{
    companion_audio_name, ContentPatch, ContentStorePort, MediaProbePort, MediaStoragePort,
    StoreError, SynthesizedAudio,
};
use crate::domain::ContentRecord;
use crate::infrastructure::adapters::ArtifactLocator;

/// 定稿错误
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// 提供方报成功但产物不在任何候选目录
    #[error("Render output not found for task code: {0}")]
    ArtifactMissing(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

/// 产物定稿器
pub struct ResultMaterializer {
    store: Arc<dyn ContentStorePort>,
    media: Arc<dyn MediaStoragePort>,
    locator: Arc<ArtifactLocator>,
    probe: Arc<dyn MediaProbePort>,
    /// 探测失败时的回退时长（秒）
    fallback_duration: u32,
}

impl ResultMaterializer {
    pub fn new(
        store: Arc<dyn ContentStorePort>,
        media: Arc<dyn MediaStoragePort>,
        locator: Arc<ArtifactLocator>,
        probe: Arc<dyn MediaProbePort>,
    ) -> Self {
        Self {
            store,
            media,
            locator,
            probe,
            fallback_duration: 0,
        }
    }

    /// 语音任务定稿：写入音频字节并完成记录
    pub async fn finalize_audio(
        &self,
        record_id: Uuid,
        audio: &SynthesizedAudio,
    ) -> Result<ContentRecord, MaterializeError> {
        let file_name = format!("audio_{}.wav", record_id);

        let disk_path = match self.media.save_audio(&file_name, &audio.audio_data).await {
            Ok(path) => path,
            Err(e) => {
                self.mark_failed(record_id, format!("Failed to write audio: {}", e))
                    .await;
                return Err(MaterializeError::IoError(e.to_string()));
            }
        };

        let duration = self
            .probe
            .duration_secs(&disk_path)
            .or_else(|| audio.duration_secs.map(|d| d.round() as u32))
            .unwrap_or(self.fallback_duration);

        let record = self
            .store
            .update(
                record_id,
                ContentPatch::completed(self.media.public_audio_path(&file_name), duration),
            )
            .await?;

        tracing::info!(
            record_id = %record_id,
            output = %self.media.public_audio_path(&file_name),
            duration_secs = duration,
            "Audio content materialized"
        );
        Ok(record)
    }

    /// 渲染任务定稿：定位产物、转正、探测、完成记录
    pub async fn finalize_render(
        &self,
        record_id: Uuid,
        task_code: &str,
    ) -> Result<ContentRecord, MaterializeError> {
        let source = match self.locator.find_render_output(task_code) {
            Some(path) => path,
            None => {
                tracing::warn!(
                    record_id = %record_id,
                    task_code = %task_code,
                    "Render reported success but output file not found in any candidate directory"
                );
                self.mark_failed(record_id, "Render output file not found".to_string())
                    .await;
                return Err(MaterializeError::ArtifactMissing(task_code.to_string()));
            }
        };

        let video_name = format!("video_{}.mp4", record_id);
        let target = self.media.video_file_path(&video_name);

        if let Err(e) = fs::copy(&source, &target).await {
            self.mark_failed(record_id, format!("Failed to copy render output: {}", e))
                .await;
            return Err(MaterializeError::IoError(e.to_string()));
        }

        // 配音临时音频转正，供用户单独下载
        let audio_public = self.promote_companion_audio(record_id).await;

        let duration = self
            .probe
            .duration_secs(&target)
            .unwrap_or(self.fallback_duration);

        let mut patch = ContentPatch::completed(self.media.public_video_path(&video_name), duration);
        patch.audio_path = audio_public;

        let record = self.store.update(record_id, patch).await?;

        // 成功复制后清理提供方的源文件，失败只记日志
        if source != target {
            if let Err(e) = fs::remove_file(&source).await {
                tracing::warn!(
                    file = %source.display(),
                    error = %e,
                    "Failed to clean up render source file"
                );
            }
        }

        tracing::info!(
            record_id = %record_id,
            task_code = %task_code,
            output = %self.media.public_video_path(&video_name),
            duration_secs = duration,
            "Video content materialized"
        );
        Ok(record)
    }

    /// 把 video_audio_{id}.wav 复制为 audio_{id}.wav，返回公开路径
    async fn promote_companion_audio(&self, record_id: Uuid) -> Option<String> {
        let temp_name = companion_audio_name(record_id);
        let source = self.locator.find_audio(&temp_name)?;

        let final_name = format!("audio_{}.wav", record_id);
        let target = self.media.audio_file_path(&final_name);

        if let Err(e) = fs::copy(&source, &target).await {
            tracing::warn!(
                file = %source.display(),
                error = %e,
                "Failed to promote companion audio"
            );
            return None;
        }

        if let Err(e) = fs::remove_file(&source).await {
            tracing::warn!(
                file = %source.display(),
                error = %e,
                "Failed to clean up companion audio temp file"
            );
        }

        Some(self.media.public_audio_path(&final_name))
    }

    async fn mark_failed(&self, record_id: Uuid, message: String) {
        if let Err(e) = self
            .store
            .update(record_id, ContentPatch::failed(message))
            .await
        {
            tracing::error!(record_id = %record_id, error = %e, "Failed to mark record failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ContentStorePort;
    use crate::domain::{ContentStatus, ContentType};
    use crate::infrastructure::adapters::{FileMediaStorage, FixedProbe};
    use crate::infrastructure::persistence::JsonContentStore;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        data_dir: std::path::PathBuf,
        store: Arc<JsonContentStore>,
        materializer: ResultMaterializer,
    }

    async fn fixture(probe: FixedProbe) -> Fixture {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().to_path_buf();

        let store = Arc::new(
            JsonContentStore::open(data_dir.join("database/contents.json"))
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
            vec!["videos".to_string(), "temp".to_string(), "result".to_string()],
            vec!["audios".to_string()],
        ));
        let materializer = ResultMaterializer::new(
            store.clone(),
            media,
            locator,
            Arc::new(probe),
        );

        Fixture {
            _dir: dir,
            data_dir,
            store,
            materializer,
        }
    }

    fn audio_record() -> ContentRecord {
        ContentRecord::new_audio(
            "你好".to_string(),
            "edgetts".to_string(),
            "zh-CN-XiaoxiaoNeural".to_string(),
        )
    }

    fn video_record() -> ContentRecord {
        ContentRecord::new_video(
            "你好".to_string(),
            "face2face".to_string(),
            String::new(),
            Uuid::new_v4(),
        )
    }

    #[tokio::test]
    async fn test_finalize_audio_completes_record() {
        let fx = fixture(FixedProbe(Some(7))).await;

        let record = audio_record();
        let id = record.id;
        fx.store.insert(record).await.unwrap();

        let audio = SynthesizedAudio {
            audio_data: b"RIFFwav".to_vec(),
            file_name: None,
            duration_secs: Some(3.0),
            service_id: None,
        };
        let updated = fx.materializer.finalize_audio(id, &audio).await.unwrap();

        assert_eq!(updated.status, ContentStatus::Completed);
        assert_eq!(updated.output_path.as_deref(), Some(&format!("/audios/audio_{}.wav", id)[..]));
        assert_eq!(updated.duration, Some(7));
        assert!(fx.data_dir.join("audios").join(format!("audio_{}.wav", id)).exists());
    }

    #[tokio::test]
    async fn test_finalize_audio_falls_back_to_gateway_duration() {
        let fx = fixture(FixedProbe(None)).await;

        let record = audio_record();
        let id = record.id;
        fx.store.insert(record).await.unwrap();

        let audio = SynthesizedAudio {
            audio_data: b"RIFFwav".to_vec(),
            file_name: None,
            duration_secs: Some(4.6),
            service_id: None,
        };
        let updated = fx.materializer.finalize_audio(id, &audio).await.unwrap();
        assert_eq!(updated.duration, Some(5));
    }

    #[tokio::test]
    async fn test_finalize_render_relocates_artifact() {
        let fx = fixture(FixedProbe(Some(30))).await;

        let mut record = video_record();
        let id = record.id;
        let code = record.allocate_task_code();
        fx.store.insert(record).await.unwrap();

        // 提供方把产物放在第二候选目录
        let temp_dir = fx.data_dir.join("temp");
        fs::create_dir_all(&temp_dir).await.unwrap();
        let source = temp_dir.join(format!("{}-r.mp4", code));
        fs::write(&source, b"mp4data").await.unwrap();

        // 配音临时音频
        let audios_dir = fx.data_dir.join("audios");
        fs::write(
            audios_dir.join(companion_audio_name(id)),
            b"wavdata",
        )
        .await
        .unwrap();

        let updated = fx.materializer.finalize_render(id, &code).await.unwrap();

        assert_eq!(updated.status, ContentStatus::Completed);
        assert_eq!(updated.content_type, ContentType::Video);
        assert_eq!(
            updated.output_path.as_deref(),
            Some(&format!("/videos/video_{}.mp4", id)[..])
        );
        assert_eq!(
            updated.audio_path.as_deref(),
            Some(&format!("/audios/audio_{}.wav", id)[..])
        );
        assert_eq!(updated.duration, Some(30));
        assert_eq!(updated.progress, 100);

        // 产物已转正，源文件与配音临时文件已清理
        assert!(fx.data_dir.join("videos").join(format!("video_{}.mp4", id)).exists());
        assert!(!source.exists());
        assert!(!audios_dir
            .join(companion_audio_name(id))
            .exists());
    }

    #[tokio::test]
    async fn test_finalize_render_missing_artifact_is_hard_failure() {
        let fx = fixture(FixedProbe(Some(30))).await;

        let mut record = video_record();
        let id = record.id;
        let code = record.allocate_task_code();
        fx.store.insert(record).await.unwrap();

        let err = fx.materializer.finalize_render(id, &code).await;
        assert!(matches!(err, Err(MaterializeError::ArtifactMissing(_))));

        // 记录被改判 failed，而不是停留在非终态
        let loaded = fx.store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ContentStatus::Failed);
        assert!(loaded.error_message.is_some());
    }
}
