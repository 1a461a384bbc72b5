//! Render Engine Port - 数字人渲染服务抽象
//!
//! 渲染服务是先提交后轮询的异步接口。响应信封码：
//! - 10000 成功
//! - 10001 服务忙 / 拒绝
//! - 10004 关联码未知（可能尚未登记，也可能已完成并被清理——
//!   这一歧义由轮询引擎的有界重试 + 本地对账处理）

use async_trait::async_trait;
use thiserror::Error;

/// 提供方信封码：成功
pub const CODE_SUCCESS: i32 = 10000;
/// 提供方信封码：服务忙 / 拒绝
pub const CODE_BUSY: i32 = 10001;
/// 提供方信封码：关联码未知
pub const CODE_NOT_FOUND: i32 = 10004;

/// data.status：渲染完成（result 为产物文件名）
pub const RENDER_STATUS_COMPLETE: i32 = 2;
/// data.status：渲染失败
pub const RENDER_STATUS_FAILED: i32 = -1;

/// 渲染错误（传输层）
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 渲染任务提交
#[derive(Debug, Clone)]
pub struct RenderSubmission {
    /// 配音音频（提供方可访问的路径 / URL）
    pub audio_url: String,
    /// 形象视频（提供方可访问的路径 / URL）
    pub video_url: String,
    /// 关联码，后续轮询的唯一键
    pub code: String,
    /// 超分辨率开关
    pub chaofen: u8,
    /// 水印开关
    pub watermark_switch: u8,
    /// 处理编号
    pub pn: u8,
}

/// 提交响应
#[derive(Debug, Clone)]
pub struct SubmitReply {
    pub code: i32,
    pub message: String,
}

impl SubmitReply {
    pub fn accepted(&self) -> bool {
        self.code == CODE_SUCCESS
    }
}

/// 状态查询响应（信封 + data 展平）
#[derive(Debug, Clone)]
pub struct RenderQueryReply {
    /// 信封码
    pub code: i32,
    /// data.status
    pub status: i32,
    /// data.progress 0..=100
    pub progress: u8,
    /// 完成时的产物文件名
    pub result: Option<String>,
    pub message: String,
}

impl RenderQueryReply {
    /// 已完成且带产物
    pub fn is_complete(&self) -> bool {
        self.code == CODE_SUCCESS && self.status == RENDER_STATUS_COMPLETE && self.result.is_some()
    }

    /// 提供方明确报告失败
    pub fn is_render_failed(&self) -> bool {
        self.code == CODE_SUCCESS && self.status == RENDER_STATUS_FAILED
    }

    /// 服务忙 / 拒绝
    pub fn is_busy(&self) -> bool {
        self.code == CODE_BUSY
    }

    /// 关联码未知
    pub fn is_unknown_code(&self) -> bool {
        self.code == CODE_NOT_FOUND
    }
}

/// Render Engine Port
#[async_trait]
pub trait RenderEnginePort: Send + Sync {
    /// 提交渲染任务
    async fn submit(&self, submission: RenderSubmission) -> Result<SubmitReply, RenderError>;

    /// 按关联码查询状态
    async fn query(&self, code: &str) -> Result<RenderQueryReply, RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_reply_classification() {
        let complete = RenderQueryReply {
            code: CODE_SUCCESS,
            status: RENDER_STATUS_COMPLETE,
            progress: 100,
            result: Some("task_x-r.mp4".to_string()),
            message: String::new(),
        };
        assert!(complete.is_complete());
        assert!(!complete.is_render_failed());

        // status=2 但缺 result 不算完成
        let no_result = RenderQueryReply {
            result: None,
            ..complete.clone()
        };
        assert!(!no_result.is_complete());

        let busy = RenderQueryReply {
            code: CODE_BUSY,
            status: 0,
            progress: 0,
            result: None,
            message: "busy".to_string(),
        };
        assert!(busy.is_busy());

        let unknown = RenderQueryReply {
            code: CODE_NOT_FOUND,
            ..busy.clone()
        };
        assert!(unknown.is_unknown_code());
    }
}
