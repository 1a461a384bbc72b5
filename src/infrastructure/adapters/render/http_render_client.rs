//! HTTP Render Client - 调用外部数字人渲染服务
//!
//! 实现 RenderEnginePort trait
//!
//! 外部渲染 API:
//! POST {base}/submit
//! Request: {"audio_url": "...", "video_url": "...", "code": "...",
//!           "chaofen": 0, "watermark_switch": 0, "pn": 1}  (JSON)
//! Response: {"code": 10000, "msg": "..."}
//!
//! GET {base}/query?code={code}
//! Response: {"code": 10000, "data": {"status": 2, "progress": 100,
//!            "result": "task_xxx-r.mp4", "msg": "..."}, "msg": "..."}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    RenderEnginePort, RenderError, RenderQueryReply, RenderSubmission, SubmitReply,
};

#[derive(Debug, Serialize)]
struct SubmitHttpRequest {
    audio_url: String,
    video_url: String,
    code: String,
    chaofen: u8,
    watermark_switch: u8,
    pn: u8,
}

#[derive(Debug, Deserialize)]
struct SubmitHttpResponse {
    code: i32,
    #[serde(default)]
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryHttpResponse {
    code: i32,
    #[serde(default)]
    data: Option<QueryHttpData>,
    #[serde(default)]
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryHttpData {
    #[serde(default)]
    status: i32,
    #[serde(default)]
    progress: Option<u8>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

/// HTTP 渲染客户端配置
#[derive(Debug, Clone)]
pub struct HttpRenderClientConfig {
    /// 渲染服务基础 URL
    pub base_url: String,
    /// 提交超时（秒）
    pub submit_timeout_secs: u64,
    /// 查询超时（秒）
    pub query_timeout_secs: u64,
}

impl Default for HttpRenderClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8383/easy".to_string(),
            submit_timeout_secs: 30,
            query_timeout_secs: 10,
        }
    }
}

/// HTTP 渲染客户端
pub struct HttpRenderClient {
    client: Client,
    config: HttpRenderClientConfig,
}

impl HttpRenderClient {
    pub fn new(config: HttpRenderClientConfig) -> Result<Self, RenderError> {
        let client = Client::builder()
            .build()
            .map_err(|e| RenderError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn submit_url(&self) -> String {
        format!("{}/submit", self.config.base_url)
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.config.base_url)
    }

    fn map_transport_error(e: reqwest::Error) -> RenderError {
        if e.is_timeout() {
            RenderError::Timeout
        } else if e.is_connect() {
            RenderError::NetworkError(format!("Cannot connect to render service: {}", e))
        } else {
            RenderError::NetworkError(e.to_string())
        }
    }
}

#[async_trait]
impl RenderEnginePort for HttpRenderClient {
    async fn submit(&self, submission: RenderSubmission) -> Result<SubmitReply, RenderError> {
        let http_request = SubmitHttpRequest {
            audio_url: submission.audio_url,
            video_url: submission.video_url,
            code: submission.code.clone(),
            chaofen: submission.chaofen,
            watermark_switch: submission.watermark_switch,
            pn: submission.pn,
        };

        tracing::debug!(
            url = %self.submit_url(),
            code = %submission.code,
            "Submitting render task"
        );

        let response = self
            .client
            .post(self.submit_url())
            .timeout(Duration::from_secs(self.config.submit_timeout_secs))
            .json(&http_request)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RenderError::InvalidResponse(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: SubmitHttpResponse = response
            .json()
            .await
            .map_err(|e| RenderError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            code = %submission.code,
            reply_code = body.code,
            "Render task submit replied"
        );

        Ok(SubmitReply {
            code: body.code,
            message: body.msg.unwrap_or_default(),
        })
    }

    async fn query(&self, code: &str) -> Result<RenderQueryReply, RenderError> {
        let response = self
            .client
            .get(self.query_url())
            .timeout(Duration::from_secs(self.config.query_timeout_secs))
            .query(&[("code", code)])
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RenderError::InvalidResponse(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: QueryHttpResponse = response
            .json()
            .await
            .map_err(|e| RenderError::InvalidResponse(e.to_string()))?;

        let data = body.data.unwrap_or(QueryHttpData {
            status: 0,
            progress: None,
            result: None,
            msg: None,
        });

        Ok(RenderQueryReply {
            code: body.code,
            status: data.status,
            progress: data.progress.unwrap_or(0).min(100),
            result: data.result,
            message: data.msg.or(body.msg).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpRenderClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8383/easy");
        assert_eq!(config.submit_timeout_secs, 30);
        assert_eq!(config.query_timeout_secs, 10);
    }

    #[test]
    fn test_query_response_parsing() {
        let raw = r#"{"code":10000,"data":{"status":2,"progress":100,"result":"task_a-r.mp4"},"msg":"ok"}"#;
        let body: QueryHttpResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.code, 10000);
        let data = body.data.unwrap();
        assert_eq!(data.status, 2);
        assert_eq!(data.result.as_deref(), Some("task_a-r.mp4"));
    }

    #[test]
    fn test_query_response_without_data() {
        // 10004 时提供方不带 data
        let raw = r#"{"code":10004,"msg":"task not found"}"#;
        let body: QueryHttpResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.code, 10004);
        assert!(body.data.is_none());
    }
}
