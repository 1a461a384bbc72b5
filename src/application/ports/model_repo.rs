//! Model Repository Port - 模型资产查找
//!
//! 编排核心只需要 id → 资产（训练/形象素材）的只读查找；
//! save 供启动播种与测试使用。

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::ModelAsset;

/// 模型仓储错误
#[derive(Debug, Error)]
pub enum ModelRepositoryError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Model Repository Port
#[async_trait]
pub trait ModelRepositoryPort: Send + Sync {
    /// 按 id 查找模型资产
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ModelAsset>, ModelRepositoryError>;

    /// 全部资产
    async fn find_all(&self) -> Result<Vec<ModelAsset>, ModelRepositoryError>;

    /// 保存资产
    async fn save(&self, asset: &ModelAsset) -> Result<(), ModelRepositoryError>;
}
