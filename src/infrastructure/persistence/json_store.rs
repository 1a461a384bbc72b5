//! JSON Content Store - 文档型内容记录存储
//!
//! 内存 DashMap 索引 + 单文件 JSON 集合落盘。
//! 补丁在 DashMap 条目锁内应用（单条记录的序列化点），
//! 落盘走 write-temp-then-rename：进程在任意时刻被杀，
//! 磁盘上要么是旧集合要么是新集合，不会出现半个文件。

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::application::ports::{ContentPatch, ContentStorePort, StoreError};
use crate::domain::ContentRecord;

/// 磁盘上的集合布局：{"contents": [...]}
#[derive(Debug, Default, Serialize, Deserialize)]
struct ContentCollection {
    #[serde(default)]
    contents: Vec<ContentRecord>,
}

/// JSON 文档存储
pub struct JsonContentStore {
    records: DashMap<Uuid, ContentRecord>,
    db_path: PathBuf,
    /// 单写者落盘锁
    flush_lock: Mutex<()>,
}

impl JsonContentStore {
    /// 打开（或初始化）存储文件
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::IoError(e.to_string()))?;
            }
        }

        let records = DashMap::new();
        match fs::read(&db_path).await {
            Ok(bytes) => {
                let collection: ContentCollection = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::SerializationError(e.to_string()))?;
                for record in collection.contents {
                    records.insert(record.id, record);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::IoError(e.to_string())),
        }

        tracing::info!(
            db_path = %db_path.display(),
            count = records.len(),
            "JsonContentStore opened"
        );

        Ok(Self {
            records,
            db_path,
            flush_lock: Mutex::new(()),
        })
    }

    /// 把当前集合原子落盘
    async fn flush(&self) -> Result<(), StoreError> {
        let _guard = self.flush_lock.lock().await;

        let mut contents: Vec<ContentRecord> =
            self.records.iter().map(|e| e.value().clone()).collect();
        contents.sort_by_key(|r| r.created_at);

        let bytes = serde_json::to_vec_pretty(&ContentCollection { contents })
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        let tmp_path = self.db_path.with_extension("json.tmp");
        fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?;
        fs::rename(&tmp_path, &self.db_path)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl ContentStorePort for JsonContentStore {
    async fn insert(&self, record: ContentRecord) -> Result<(), StoreError> {
        let id = record.id;
        if self.records.contains_key(&id) {
            return Err(StoreError::Duplicate(id));
        }
        self.records.insert(id, record);
        self.flush().await?;

        tracing::debug!(record_id = %id, "Content record inserted");
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ContentRecord>, StoreError> {
        Ok(self.records.get(&id).map(|r| r.clone()))
    }

    async fn get_by_task_code(&self, code: &str) -> Result<Option<ContentRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .find(|r| r.task_code.as_deref() == Some(code))
            .map(|r| r.clone()))
    }

    async fn list(&self) -> Result<Vec<ContentRecord>, StoreError> {
        let mut all: Vec<ContentRecord> = self.records.iter().map(|r| r.clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update(&self, id: Uuid, patch: ContentPatch) -> Result<ContentRecord, StoreError> {
        // 条目锁内应用补丁，锁释放后再落盘
        let updated = {
            let mut entry = self.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            patch.apply_to(entry.value_mut())?;
            entry.value().clone()
        };
        self.flush().await?;
        Ok(updated)
    }

    async fn remove(&self, id: Uuid) -> Result<Option<ContentRecord>, StoreError> {
        let removed = self.records.remove(&id).map(|(_, r)| r);
        if removed.is_some() {
            self.flush().await?;
            tracing::debug!(record_id = %id, "Content record removed");
        }
        Ok(removed)
    }
}
