//! Content Store Port - 内容记录存储
//!
//! JSON 文档存储的抽象接口。所有写入都通过 `update(id, patch)`
//! 走同一个序列化点：并发写（轮询完成落库、用户切换收藏、清理删除）
//! 在单条记录上互不覆盖。补丁应用处同时守护不变量：
//! 状态只向前、进度单调不减、ever_favorited 置位后永不清除。

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{ContentRecord, ContentStatus};

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(Uuid),

    #[error("Duplicate record: {0}")]
    Duplicate(Uuid),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 内容记录的部分更新
///
/// 未设置的字段保持原值。`force_status` 仅供启动恢复使用，
/// 允许把产物丢失的 completed 记录改判为 failed。
#[derive(Debug, Clone, Default)]
pub struct ContentPatch {
    pub status: Option<ContentStatus>,
    pub progress: Option<u8>,
    pub task_code: Option<String>,
    pub output_path: Option<String>,
    pub audio_path: Option<String>,
    pub duration: Option<u32>,
    pub error_message: Option<String>,
    pub is_favorite: Option<bool>,
    pub force_status: bool,
}

impl ContentPatch {
    /// 标记失败
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(ContentStatus::Failed),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// 标记渲染中并更新进度
    pub fn processing(progress: u8) -> Self {
        Self {
            status: Some(ContentStatus::Processing),
            progress: Some(progress),
            ..Default::default()
        }
    }

    /// 定稿：产物路径 + 时长
    pub fn completed(output_path: String, duration: u32) -> Self {
        Self {
            status: Some(ContentStatus::Completed),
            progress: Some(100),
            output_path: Some(output_path),
            duration: Some(duration),
            ..Default::default()
        }
    }

    /// 应用补丁，所有不变量在此收口
    pub fn apply_to(&self, record: &mut ContentRecord) -> Result<(), StoreError> {
        if let Some(next) = self.status {
            if next != record.status && !record.status.can_transition_to(next) {
                if !self.force_status {
                    return Err(StoreError::InvalidTransition {
                        from: record.status.as_str().to_string(),
                        to: next.as_str().to_string(),
                    });
                }
                // 强制改判时清掉指向已不存在产物的路径
                record.output_path = None;
                record.duration = None;
            }
            record.status = next;
        }

        if let Some(progress) = self.progress {
            // 进度单调不减
            record.progress = record.progress.max(progress.min(100));
        }

        if let Some(ref code) = self.task_code {
            record.task_code = Some(code.clone());
        }
        if let Some(ref path) = self.output_path {
            record.output_path = Some(path.clone());
        }
        if let Some(ref path) = self.audio_path {
            record.audio_path = Some(path.clone());
        }
        if let Some(duration) = self.duration {
            record.duration = Some(duration);
        }
        if let Some(ref message) = self.error_message {
            record.error_message = Some(message.clone());
        }

        if let Some(favorite) = self.is_favorite {
            record.is_favorite = favorite;
            if favorite {
                // 粘性收藏：置位后永不清除
                record.ever_favorited = true;
            }
        }

        record.updated_at = chrono::Utc::now();
        Ok(())
    }
}

/// Content Store Port
#[async_trait]
pub trait ContentStorePort: Send + Sync {
    /// 插入新记录
    async fn insert(&self, record: ContentRecord) -> Result<(), StoreError>;

    /// 按 id 查找
    async fn get(&self, id: Uuid) -> Result<Option<ContentRecord>, StoreError>;

    /// 按关联码查找
    async fn get_by_task_code(&self, code: &str) -> Result<Option<ContentRecord>, StoreError>;

    /// 全部记录（创建时间倒序）
    async fn list(&self) -> Result<Vec<ContentRecord>, StoreError>;

    /// 在单条记录的序列化点上应用补丁，返回更新后的记录
    async fn update(&self, id: Uuid, patch: ContentPatch) -> Result<ContentRecord, StoreError>;

    /// 删除记录，返回被删除的记录
    async fn remove(&self, id: Uuid) -> Result<Option<ContentRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContentRecord {
        ContentRecord::new_audio(
            "测试".to_string(),
            "edgetts".to_string(),
            "zh-CN-XiaoxiaoNeural".to_string(),
        )
    }

    #[test]
    fn test_patch_rejects_terminal_regression() {
        let mut record = sample();
        ContentPatch::completed("/audios/a.wav".to_string(), 3)
            .apply_to(&mut record)
            .unwrap();

        let err = ContentPatch::failed("late failure").apply_to(&mut record);
        assert!(matches!(err, Err(StoreError::InvalidTransition { .. })));
        assert_eq!(record.status, ContentStatus::Completed);
    }

    #[test]
    fn test_force_status_clears_stale_output() {
        let mut record = sample();
        ContentPatch::completed("/audios/a.wav".to_string(), 3)
            .apply_to(&mut record)
            .unwrap();

        let mut patch = ContentPatch::failed("artifact file missing");
        patch.force_status = true;
        patch.apply_to(&mut record).unwrap();

        assert_eq!(record.status, ContentStatus::Failed);
        assert!(record.output_path.is_none());
        assert!(record.duration.is_none());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut record = sample();
        ContentPatch::processing(40).apply_to(&mut record).unwrap();
        assert_eq!(record.progress, 40);

        // 提供方偶尔回退的进度被钳住
        ContentPatch {
            progress: Some(10),
            ..Default::default()
        }
        .apply_to(&mut record)
        .unwrap();
        assert_eq!(record.progress, 40);
    }

    #[test]
    fn test_ever_favorited_is_sticky() {
        let mut record = sample();
        ContentPatch {
            is_favorite: Some(true),
            ..Default::default()
        }
        .apply_to(&mut record)
        .unwrap();
        assert!(record.is_favorite);
        assert!(record.ever_favorited);

        ContentPatch {
            is_favorite: Some(false),
            ..Default::default()
        }
        .apply_to(&mut record)
        .unwrap();
        assert!(!record.is_favorite);
        assert!(record.ever_favorited);
    }
}
