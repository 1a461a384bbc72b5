//! Content Commands - 生成 / 管理命令定义

use serde_json::Value;
use uuid::Uuid;

use crate::domain::ContentStatus;

/// 渲染选项（未指定时使用配置默认）
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// 超分辨率开关
    pub chaofen: u8,
    /// 水印开关
    pub watermark_switch: u8,
    /// 处理编号
    pub pn: u8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            chaofen: 0,
            watermark_switch: 0,
            pn: 1,
        }
    }
}

/// 提交语音生成
#[derive(Debug, Clone)]
pub struct SubmitAudioCommand {
    /// 合成文本
    pub input_text: String,
    /// TTS 提供方（edgetts / minimax / ...）
    pub provider: String,
    /// 音色 / 模型名
    pub tts_model: String,
    /// 提供方相关参数，原样透传
    pub voice_config: Value,
    /// 语言
    pub language: String,
}

impl SubmitAudioCommand {
    pub fn new(input_text: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
            provider: provider.into(),
            tts_model: String::new(),
            voice_config: Value::Null,
            language: "zh".to_string(),
        }
    }
}

/// 提交视频生成
#[derive(Debug, Clone)]
pub struct SubmitVideoCommand {
    /// 合成文本（可为空，此时必须提供参考音频）
    pub input_text: String,
    /// TTS 提供方（配音用）
    pub provider: String,
    /// 音色 / 模型名
    pub tts_model: String,
    /// 形象模型资产
    pub model_id: Uuid,
    /// 跳过 TTS，直接使用的配音音频路径
    pub reference_audio: Option<String>,
    /// TTS 参数，原样透传
    pub voice_config: Value,
    /// 语言
    pub language: String,
    /// 渲染选项覆盖
    pub options: Option<RenderOptions>,
}

impl SubmitVideoCommand {
    pub fn new(
        input_text: impl Into<String>,
        provider: impl Into<String>,
        model_id: Uuid,
    ) -> Self {
        Self {
            input_text: input_text.into(),
            provider: provider.into(),
            tts_model: String::new(),
            model_id,
            reference_audio: None,
            voice_config: Value::Null,
            language: "zh".to_string(),
            options: None,
        }
    }
}

/// 提交响应：任务已存在（可能已同步失败），立即返回
#[derive(Debug, Clone)]
pub struct SubmitContentResponse {
    pub record_id: Uuid,
    /// 渲染任务的关联码；语音任务为 None
    pub task_code: Option<String>,
    pub status: ContentStatus,
}

/// 切换收藏
#[derive(Debug, Clone)]
pub struct ToggleFavoriteCommand {
    pub record_id: Uuid,
    pub is_favorite: bool,
}

/// 删除内容（记录与产物一起）
#[derive(Debug, Clone)]
pub struct DeleteContentCommand {
    pub record_id: Uuid,
}
