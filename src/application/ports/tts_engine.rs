//! TTS Engine Port - 语音合成网关抽象
//!
//! 定义对外部 TTS 网关的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesizeRequest {
    /// 要合成的文本内容
    pub text: String,
    /// 网关内的服务标识（edgetts / minimax / ...）
    pub service: String,
    /// 服务相关的音色参数（原样透传）
    pub voice_config: serde_json::Value,
    /// 输出格式
    pub format: String,
    /// 语言
    pub language: String,
}

impl SynthesizeRequest {
    pub fn new(text: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            service: service.into(),
            voice_config: serde_json::Value::Null,
            format: "wav".to_string(),
            language: "zh".to_string(),
        }
    }
}

/// 合成结果：音频字节 + 响应头里的元数据
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub audio_data: Vec<u8>,
    /// 网关生成的文件名
    pub file_name: Option<String>,
    /// 音频时长（秒）
    pub duration_secs: Option<f32>,
    /// 实际处理请求的服务标识
    pub service_id: Option<String>,
}

/// TTS Engine Port
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 合成语音，返回音频数据
    async fn synthesize(&self, request: SynthesizeRequest) -> Result<SynthesizedAudio, TtsError>;

    /// 检查 TTS 网关是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
