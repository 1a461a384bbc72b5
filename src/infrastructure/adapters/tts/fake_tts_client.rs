//! Fake TTS Client - 用于测试的 TTS 客户端
//!
//! 始终返回固定的音频字节，不实际调用 TTS 网关

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::application::ports::{SynthesizeRequest, SynthesizedAudio, TtsEnginePort, TtsError};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 固定返回的音频数据
    pub audio_data: Vec<u8>,
    /// 固定返回的音频时长（秒）
    pub duration_secs: f32,
    /// 是否模拟服务错误
    pub fail_with: Option<String>,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            audio_data: b"RIFFfakewavdata".to_vec(),
            duration_secs: 5.0,
            fail_with: None,
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
    call_count: AtomicUsize,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        Self {
            config,
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }

    /// 构造一个总是失败的客户端
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(FakeTtsClientConfig {
            fail_with: Some(message.into()),
            ..Default::default()
        })
    }

    /// 已处理的合成请求数
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesizeRequest) -> Result<SynthesizedAudio, TtsError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(
            text_len = request.text.len(),
            service = %request.service,
            "FakeTtsClient: returning fixed audio"
        );

        if let Some(ref message) = self.config.fail_with {
            return Err(TtsError::ServiceError(message.clone()));
        }

        Ok(SynthesizedAudio {
            audio_data: self.config.audio_data.clone(),
            file_name: Some(format!("tts_{}_fake.wav", request.service)),
            duration_secs: Some(self.config.duration_secs),
            service_id: Some(request.service),
        })
    }
}
