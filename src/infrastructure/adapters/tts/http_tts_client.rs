//! HTTP TTS Client - 调用外部 TTS 网关
//!
//! 实现 TtsEnginePort trait，通过 HTTP 调用统一 TTS 网关
//!
//! 外部 TTS API:
//! POST http://localhost:18180/api/tts/synthesize
//! Request: {"text": "...", "service": "edgetts", "voice_config": {...},
//!           "format": "wav", "language": "zh"}  (JSON)
//! Response: 音频二进制，元数据在响应头
//! (X-Service / X-Duration / X-Filename)

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{SynthesizeRequest, SynthesizedAudio, TtsEnginePort, TtsError};

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest {
    text: String,
    service: String,
    voice_config: serde_json::Value,
    format: String,
    language: String,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 网关基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:18180".to_string(),
            timeout_secs: 120,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn synthesize_url(&self) -> String {
        format!("{}/api/tts/synthesize", self.config.base_url)
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url)
    }
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(&self, request: SynthesizeRequest) -> Result<SynthesizedAudio, TtsError> {
        let http_request = TtsHttpRequest {
            text: request.text,
            service: request.service,
            voice_config: request.voice_config,
            format: request.format,
            language: request.language,
        };

        tracing::debug!(
            url = %self.synthesize_url(),
            service = %http_request.service,
            text_len = http_request.text.len(),
            "Sending TTS synthesize request"
        );

        let response = self
            .client
            .post(self.synthesize_url())
            .json(&http_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS gateway: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        // 从 headers 提取元数据
        let headers = response.headers();
        let service_id = headers
            .get("X-Service")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let duration_secs = headers
            .get("X-Duration")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let file_name = headers
            .get("X-Filename")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        if audio_data.is_empty() {
            return Err(TtsError::InvalidResponse("Empty audio body".to_string()));
        }

        tracing::info!(
            service_id = ?service_id,
            duration_secs = ?duration_secs,
            audio_size = audio_data.len(),
            "TTS synthesis completed"
        );

        Ok(SynthesizedAudio {
            audio_data,
            file_name,
            duration_secs,
            service_id,
        })
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
