//! Content Record - 生成内容记录
//!
//! 记录一次语音/视频生成任务的完整生命周期：
//! 创建（generating）→ 渲染中（processing）→ 终态（completed / failed）。
//! 终态之后状态不再回退，收藏标记 ever_favorited 一经置位永不清除。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 内容类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// 语音合成
    Audio,
    /// 数字人视频
    Video,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Audio => "audio",
            ContentType::Video => "video",
        }
    }
}

/// 内容生成状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    /// 已创建，等待/正在向提供方提交
    Generating,
    /// 提供方已接受，渲染进行中
    Processing,
    /// 产物已落盘，记录已定稿
    Completed,
    /// 生成失败
    Failed,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Generating => "generating",
            ContentStatus::Processing => "processing",
            ContentStatus::Completed => "completed",
            ContentStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "generating" => Some(ContentStatus::Generating),
            "processing" => Some(ContentStatus::Processing),
            "completed" => Some(ContentStatus::Completed),
            "failed" => Some(ContentStatus::Failed),
            _ => None,
        }
    }

    /// 是否为终态（completed / failed）
    pub fn is_terminal(&self) -> bool {
        matches!(self, ContentStatus::Completed | ContentStatus::Failed)
    }

    /// 状态只允许向前推进，终态不可离开
    pub fn can_transition_to(&self, next: ContentStatus) -> bool {
        match self {
            ContentStatus::Generating => matches!(
                next,
                ContentStatus::Processing | ContentStatus::Completed | ContentStatus::Failed
            ),
            ContentStatus::Processing => {
                matches!(next, ContentStatus::Completed | ContentStatus::Failed)
            }
            ContentStatus::Completed | ContentStatus::Failed => false,
        }
    }
}

/// 生成内容记录（JSON 文档，camelCase 字段）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// 合成文本；非 TTS 的视频任务可为空
    #[serde(default)]
    pub input_text: String,
    /// TTS / 渲染提供方标识
    pub provider: String,
    /// 提供方下的具体音色 / 渲染模型
    #[serde(default)]
    pub tts_model: String,
    /// 视频任务引用的模型资产
    #[serde(default)]
    pub model_id: Option<Uuid>,
    /// 关联码：提交渲染任务时生成，轮询的唯一键
    #[serde(default)]
    pub task_code: Option<String>,
    pub status: ContentStatus,
    /// 渲染进度 0..=100，单调不减
    #[serde(default)]
    pub progress: u8,
    /// 公开访问路径（/audios/.. 或 /videos/..），仅 completed 时有值
    #[serde(default)]
    pub output_path: Option<String>,
    /// 视频任务的配音音频（与产物一同清理）
    #[serde(default)]
    pub audio_path: Option<String>,
    /// 产物时长（秒）
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    /// 粘性收藏标记：曾经收藏过即永久保留，清理永不删除
    #[serde(default)]
    pub ever_favorited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentRecord {
    /// 创建语音生成记录
    pub fn new_audio(input_text: String, provider: String, tts_model: String) -> Self {
        Self::new(ContentType::Audio, input_text, provider, tts_model, None)
    }

    /// 创建视频生成记录
    pub fn new_video(
        input_text: String,
        provider: String,
        tts_model: String,
        model_id: Uuid,
    ) -> Self {
        Self::new(
            ContentType::Video,
            input_text,
            provider,
            tts_model,
            Some(model_id),
        )
    }

    fn new(
        content_type: ContentType,
        input_text: String,
        provider: String,
        tts_model: String,
        model_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            content_type,
            input_text,
            provider,
            tts_model,
            model_id,
            task_code: None,
            status: ContentStatus::Generating,
            progress: 0,
            output_path: None,
            audio_path: None,
            duration: None,
            error_message: None,
            is_favorite: false,
            ever_favorited: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// 生成全局唯一的关联码，记录 id 可从码中还原
    pub fn allocate_task_code(&mut self) -> String {
        let code = format!("task_{}_{}", self.id, Uuid::new_v4().simple());
        self.task_code = Some(code.clone());
        code
    }

    /// 记录年龄（秒）
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds()
    }
}

/// 从关联码中还原记录 id（格式 task_{uuid}_{suffix}）
pub fn record_id_from_task_code(code: &str) -> Option<Uuid> {
    let rest = code.strip_prefix("task_")?;
    // Uuid 带连字符固定 36 字符
    let id_part = rest.get(..36)?;
    Uuid::parse_str(id_part).ok()
}
