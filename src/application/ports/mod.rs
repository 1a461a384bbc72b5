//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod cleanup;
mod content_store;
mod media_probe;
mod media_storage;
mod model_repo;
mod render_engine;
mod scheduler;
mod tts_engine;

pub use cleanup::{CleanupRunnerPort, CleanupStats};
pub use content_store::{ContentPatch, ContentStorePort, StoreError};
pub use media_probe::MediaProbePort;
pub use media_storage::{companion_audio_name, MediaStorageError, MediaStoragePort};
pub use model_repo::{ModelRepositoryError, ModelRepositoryPort};
pub use render_engine::{
    RenderEnginePort, RenderError, RenderQueryReply, RenderSubmission, SubmitReply, CODE_BUSY,
    CODE_NOT_FOUND, CODE_SUCCESS, RENDER_STATUS_COMPLETE, RENDER_STATUS_FAILED,
};
pub use scheduler::{GenerationJob, JobSchedulerPort, SchedulerError, SynthesisJob};
pub use tts_engine::{SynthesizeRequest, SynthesizedAudio, TtsEnginePort, TtsError};
