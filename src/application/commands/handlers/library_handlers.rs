//! Library Command Handlers - 作品管理
//!
//! 收藏切换、删除与手动清理。删除始终记录与产物一起走，
//! 产物文件早已丢失时记一条告警但仍然成功。

use std::sync::Arc;

use crate::application::commands::content_commands::{DeleteContentCommand, ToggleFavoriteCommand};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    CleanupRunnerPort, CleanupStats, ContentPatch, ContentStorePort, MediaStoragePort, StoreError,
};
use crate::domain::ContentRecord;

/// ToggleFavorite Handler - 收藏切换
pub struct ToggleFavoriteHandler {
    store: Arc<dyn ContentStorePort>,
}

impl ToggleFavoriteHandler {
    pub fn new(store: Arc<dyn ContentStorePort>) -> Self {
        Self { store }
    }

    /// 置 true 时 ever_favorited 永久置位，取消收藏不清除
    pub async fn handle(
        &self,
        cmd: ToggleFavoriteCommand,
    ) -> Result<ContentRecord, ApplicationError> {
        let patch = ContentPatch {
            is_favorite: Some(cmd.is_favorite),
            ..Default::default()
        };

        match self.store.update(cmd.record_id, patch).await {
            Ok(record) => {
                tracing::info!(
                    record_id = %cmd.record_id,
                    is_favorite = cmd.is_favorite,
                    ever_favorited = record.ever_favorited,
                    "Favorite toggled"
                );
                Ok(record)
            }
            Err(StoreError::NotFound(id)) => Err(ApplicationError::not_found("Content", id)),
            Err(e) => Err(e.into()),
        }
    }
}

/// DeleteContent Handler - 删除作品
pub struct DeleteContentHandler {
    store: Arc<dyn ContentStorePort>,
    media: Arc<dyn MediaStoragePort>,
}

impl DeleteContentHandler {
    pub fn new(store: Arc<dyn ContentStorePort>, media: Arc<dyn MediaStoragePort>) -> Self {
        Self { store, media }
    }

    pub async fn handle(&self, cmd: DeleteContentCommand) -> Result<(), ApplicationError> {
        let record = self
            .store
            .get(cmd.record_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Content", cmd.record_id))?;

        // 先删文件再删记录；文件缺失 / 删除失败不阻塞记录删除
        for public_path in [record.output_path.as_deref(), record.audio_path.as_deref()]
            .into_iter()
            .flatten()
        {
            match self.media.remove_by_public_path(public_path).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(
                        record_id = %cmd.record_id,
                        path = %public_path,
                        "Artifact file already missing during delete"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        record_id = %cmd.record_id,
                        path = %public_path,
                        error = %e,
                        "Failed to delete artifact file"
                    );
                }
            }
        }

        self.store.remove(cmd.record_id).await?;
        tracing::info!(record_id = %cmd.record_id, "Content deleted");
        Ok(())
    }
}

/// RunCleanup Handler - 手动触发一轮清理
pub struct RunCleanupHandler {
    cleanup: Arc<dyn CleanupRunnerPort>,
}

impl RunCleanupHandler {
    pub fn new(cleanup: Arc<dyn CleanupRunnerPort>) -> Self {
        Self { cleanup }
    }

    pub async fn handle(&self) -> CleanupStats {
        self.cleanup.run_cleanup().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContentStatus;
    use crate::infrastructure::adapters::FileMediaStorage;
    use crate::infrastructure::persistence::JsonContentStore;
    use tempfile::TempDir;
    use uuid::Uuid;

    struct Fixture {
        _dir: TempDir,
        data_dir: std::path::PathBuf,
        store: Arc<JsonContentStore>,
        media: Arc<FileMediaStorage>,
    }

    async fn fixture() -> Fixture {
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
        Fixture {
            _dir: dir,
            data_dir,
            store,
            media,
        }
    }

    async fn insert_completed(fx: &Fixture, with_file: bool) -> Uuid {
        let mut record = ContentRecord::new_audio(
            "测试".to_string(),
            "edgetts".to_string(),
            String::new(),
        );
        record.status = ContentStatus::Completed;
        record.output_path = Some(format!("/audios/audio_{}.wav", record.id));
        let id = record.id;
        if with_file {
            tokio::fs::write(
                fx.data_dir.join("audios").join(format!("audio_{}.wav", id)),
                b"wav",
            )
            .await
            .unwrap();
        }
        fx.store.insert(record).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_toggle_favorite_sets_sticky_pin() {
        let fx = fixture().await;
        let id = insert_completed(&fx, false).await;

        let handler = ToggleFavoriteHandler::new(fx.store.clone());

        let record = handler
            .handle(ToggleFavoriteCommand {
                record_id: id,
                is_favorite: true,
            })
            .await
            .unwrap();
        assert!(record.is_favorite);
        assert!(record.ever_favorited);

        let record = handler
            .handle(ToggleFavoriteCommand {
                record_id: id,
                is_favorite: false,
            })
            .await
            .unwrap();
        assert!(!record.is_favorite);
        // 粘性保留
        assert!(record.ever_favorited);
    }

    #[tokio::test]
    async fn test_toggle_favorite_missing_record() {
        let fx = fixture().await;
        let handler = ToggleFavoriteHandler::new(fx.store.clone());

        let err = handler
            .handle(ToggleFavoriteCommand {
                record_id: Uuid::new_v4(),
                is_favorite: true,
            })
            .await;
        assert!(matches!(err, Err(ApplicationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_file() {
        let fx = fixture().await;
        let id = insert_completed(&fx, true).await;
        let file = fx.data_dir.join("audios").join(format!("audio_{}.wav", id));
        assert!(file.exists());

        let handler = DeleteContentHandler::new(fx.store.clone(), fx.media.clone());
        handler
            .handle(DeleteContentCommand { record_id: id })
            .await
            .unwrap();

        assert!(!file.exists());
        assert!(fx.store.get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_succeeds_when_artifact_already_missing() {
        let fx = fixture().await;
        let id = insert_completed(&fx, false).await;

        let handler = DeleteContentHandler::new(fx.store.clone(), fx.media.clone());
        handler
            .handle(DeleteContentCommand { record_id: id })
            .await
            .unwrap();

        assert!(fx.store.get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_record_errors() {
        let fx = fixture().await;
        let handler = DeleteContentHandler::new(fx.store.clone(), fx.media.clone());

        let err = handler
            .handle(DeleteContentCommand {
                record_id: Uuid::new_v4(),
            })
            .await;
        assert!(matches!(err, Err(ApplicationError::NotFound { .. })));
    }
}
