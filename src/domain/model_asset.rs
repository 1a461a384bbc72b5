//! Model Asset - 模型资产
//!
//! 已训练的音色或数字人形象资源。编排核心只消费
//! `id → training_files` 映射：渲染任务以其中的文件作为形象输入。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 资产类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// 音色模型
    Voice,
    /// 数字人形象模型
    Character,
}

/// 模型资产（JSON 文档，camelCase 字段）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAsset {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub provider: String,
    #[serde(default)]
    pub language: String,
    /// 提供方相关的音色参数（原样透传）
    #[serde(default)]
    pub voice_settings: Option<serde_json::Value>,
    /// 训练 / 形象素材文件
    #[serde(default)]
    pub training_files: Vec<String>,
    #[serde(default = "default_status")]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

fn default_status() -> String {
    "ready".to_string()
}

impl ModelAsset {
    /// 渲染输入的首个素材文件
    pub fn primary_training_file(&self) -> Option<&str> {
        self.training_files.first().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_training_file() {
        let asset = ModelAsset {
            id: Uuid::new_v4(),
            name: "主播形象".to_string(),
            asset_type: AssetType::Character,
            provider: "face2face".to_string(),
            language: "zh-TW".to_string(),
            voice_settings: None,
            training_files: vec!["anchor.mp4".to_string(), "extra.mp4".to_string()],
            status: "ready".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(asset.primary_training_file(), Some("anchor.mp4"));

        let empty = ModelAsset {
            training_files: vec![],
            ..asset
        };
        assert_eq!(empty.primary_training_file(), None);
    }
}
