//! Fake Render Client - 用于测试的渲染客户端
//!
//! 提交回复固定，查询按预置脚本逐条回放，
//! 耗尽后重复最后一条。用于驱动轮询状态机测试。

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::application::ports::{
    RenderEnginePort, RenderError, RenderQueryReply, RenderSubmission, SubmitReply, CODE_SUCCESS,
};

/// 一次查询的脚本化结果
#[derive(Debug)]
pub enum ScriptedReply {
    Reply(RenderQueryReply),
    /// 模拟网络错误
    TransportError,
}

/// Fake Render Client
pub struct FakeRenderClient {
    submit_reply: SubmitReply,
    script: Mutex<Vec<ScriptedReply>>,
    cursor: AtomicUsize,
    submit_count: AtomicUsize,
    query_count: AtomicUsize,
}

impl FakeRenderClient {
    pub fn new(submit_reply: SubmitReply, script: Vec<ScriptedReply>) -> Self {
        Self {
            submit_reply,
            script: Mutex::new(script),
            cursor: AtomicUsize::new(0),
            submit_count: AtomicUsize::new(0),
            query_count: AtomicUsize::new(0),
        }
    }

    /// 提交成功 + 查询脚本
    pub fn accepting(script: Vec<ScriptedReply>) -> Self {
        Self::new(
            SubmitReply {
                code: CODE_SUCCESS,
                message: "success".to_string(),
            },
            script,
        )
    }

    /// 提交被拒绝（busy / invalid）
    pub fn rejecting(code: i32, message: impl Into<String>) -> Self {
        Self::new(
            SubmitReply {
                code,
                message: message.into(),
            },
            Vec::new(),
        )
    }

    pub fn submit_count(&self) -> usize {
        self.submit_count.load(Ordering::SeqCst)
    }

    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }
}

/// 便捷构造：进行中
pub fn in_progress(progress: u8) -> ScriptedReply {
    ScriptedReply::Reply(RenderQueryReply {
        code: CODE_SUCCESS,
        status: 1,
        progress,
        result: None,
        message: String::new(),
    })
}

/// 便捷构造：完成
pub fn complete(result: impl Into<String>) -> ScriptedReply {
    ScriptedReply::Reply(RenderQueryReply {
        code: CODE_SUCCESS,
        status: crate::application::ports::RENDER_STATUS_COMPLETE,
        progress: 100,
        result: Some(result.into()),
        message: String::new(),
    })
}

/// 便捷构造：提供方报告失败
pub fn render_failed(message: impl Into<String>) -> ScriptedReply {
    ScriptedReply::Reply(RenderQueryReply {
        code: CODE_SUCCESS,
        status: crate::application::ports::RENDER_STATUS_FAILED,
        progress: 0,
        result: None,
        message: message.into(),
    })
}

/// 便捷构造：关联码未知
pub fn unknown_code() -> ScriptedReply {
    ScriptedReply::Reply(RenderQueryReply {
        code: crate::application::ports::CODE_NOT_FOUND,
        status: 0,
        progress: 0,
        result: None,
        message: "task not found".to_string(),
    })
}

#[async_trait]
impl RenderEnginePort for FakeRenderClient {
    async fn submit(&self, _submission: RenderSubmission) -> Result<SubmitReply, RenderError> {
        self.submit_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.submit_reply.clone())
    }

    async fn query(&self, _code: &str) -> Result<RenderQueryReply, RenderError> {
        self.query_count.fetch_add(1, Ordering::SeqCst);

        let script = self.script.lock().unwrap();
        if script.is_empty() {
            return Ok(RenderQueryReply {
                code: crate::application::ports::CODE_NOT_FOUND,
                status: 0,
                progress: 0,
                result: None,
                message: "empty script".to_string(),
            });
        }

        let index = self
            .cursor
            .fetch_add(1, Ordering::SeqCst)
            .min(script.len() - 1);
        match &script[index] {
            ScriptedReply::Reply(reply) => Ok(reply.clone()),
            ScriptedReply::TransportError => {
                Err(RenderError::NetworkError("connection refused".to_string()))
            }
        }
    }
}
