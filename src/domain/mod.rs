//! Domain Layer - 领域模型
//!
//! - Content Context: 生成内容记录及其状态机
//! - Model Asset: 音色 / 数字人形象资产（协作方，核心只读）

pub mod content;
pub mod model_asset;

pub use content::{record_id_from_task_code, ContentRecord, ContentStatus, ContentType};
pub use model_asset::{AssetType, ModelAsset};
