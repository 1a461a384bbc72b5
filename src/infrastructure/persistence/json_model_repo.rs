//! JSON Model Repository - 模型资产文档存储
//!
//! 与内容存储同一套落盘方式，集合布局 {"models": [...]}。

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::application::ports::{ModelRepositoryError, ModelRepositoryPort};
use crate::domain::ModelAsset;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ModelCollection {
    #[serde(default)]
    models: Vec<ModelAsset>,
}

/// JSON 模型资产仓储
pub struct JsonModelRepository {
    models: DashMap<Uuid, ModelAsset>,
    db_path: PathBuf,
    flush_lock: Mutex<()>,
}

impl JsonModelRepository {
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self, ModelRepositoryError> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ModelRepositoryError::IoError(e.to_string()))?;
            }
        }

        let models = DashMap::new();
        match fs::read(&db_path).await {
            Ok(bytes) => {
                let collection: ModelCollection = serde_json::from_slice(&bytes)
                    .map_err(|e| ModelRepositoryError::SerializationError(e.to_string()))?;
                for asset in collection.models {
                    models.insert(asset.id, asset);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ModelRepositoryError::IoError(e.to_string())),
        }

        tracing::info!(
            db_path = %db_path.display(),
            count = models.len(),
            "JsonModelRepository opened"
        );

        Ok(Self {
            models,
            db_path,
            flush_lock: Mutex::new(()),
        })
    }

    async fn flush(&self) -> Result<(), ModelRepositoryError> {
        let _guard = self.flush_lock.lock().await;

        let mut collection: Vec<ModelAsset> = self.models.iter().map(|e| e.clone()).collect();
        collection.sort_by_key(|m| m.created_at);

        let bytes = serde_json::to_vec_pretty(&ModelCollection { models: collection })
            .map_err(|e| ModelRepositoryError::SerializationError(e.to_string()))?;

        let tmp_path = self.db_path.with_extension("json.tmp");
        fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| ModelRepositoryError::IoError(e.to_string()))?;
        fs::rename(&tmp_path, &self.db_path)
            .await
            .map_err(|e| ModelRepositoryError::IoError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl ModelRepositoryPort for JsonModelRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ModelAsset>, ModelRepositoryError> {
        Ok(self.models.get(&id).map(|m| m.clone()))
    }

    async fn find_all(&self) -> Result<Vec<ModelAsset>, ModelRepositoryError> {
        let mut all: Vec<ModelAsset> = self.models.iter().map(|m| m.clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn save(&self, asset: &ModelAsset) -> Result<(), ModelRepositoryError> {
        self.models.insert(asset.id, asset.clone());
        self.flush().await
    }
}
