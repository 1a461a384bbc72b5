//! Application Context - 对外操作装配
//!
//! 把全部入站操作装配到一起，供外层
//! （CLI / HTTP 接入层）直接调用。

use std::sync::Arc;

use crate::application::commands::{
    DeleteContentHandler, RenderOptions, RunCleanupHandler, SubmitAudioHandler,
    SubmitVideoHandler, ToggleFavoriteHandler,
};
use crate::application::ports::{
    CleanupRunnerPort, ContentStorePort, JobSchedulerPort, MediaStoragePort, ModelRepositoryPort,
    RenderEnginePort, TtsEnginePort,
};
use crate::application::queries::{GetContentHandler, JobStatusHandler, ListContentHandler};

/// 对外操作集合
pub struct AppContext {
    pub submit_audio: SubmitAudioHandler,
    pub submit_video: SubmitVideoHandler,
    pub job_status: JobStatusHandler,
    pub toggle_favorite: ToggleFavoriteHandler,
    pub delete_content: DeleteContentHandler,
    pub get_content: GetContentHandler,
    pub list_content: ListContentHandler,
    pub run_cleanup: RunCleanupHandler,
}

impl AppContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ContentStorePort>,
        model_repo: Arc<dyn ModelRepositoryPort>,
        tts_engine: Arc<dyn TtsEnginePort>,
        render_engine: Arc<dyn RenderEnginePort>,
        media: Arc<dyn MediaStoragePort>,
        scheduler: Arc<dyn JobSchedulerPort>,
        cleanup: Arc<dyn CleanupRunnerPort>,
        render_options: RenderOptions,
    ) -> Self {
        Self {
            submit_audio: SubmitAudioHandler::new(store.clone(), scheduler.clone()),
            submit_video: SubmitVideoHandler::new(
                store.clone(),
                model_repo,
                tts_engine,
                render_engine.clone(),
                media.clone(),
                scheduler,
                render_options,
            ),
            job_status: JobStatusHandler::new(store.clone(), render_engine),
            toggle_favorite: ToggleFavoriteHandler::new(store.clone()),
            delete_content: DeleteContentHandler::new(store.clone(), media),
            get_content: GetContentHandler::new(store.clone()),
            list_content: ListContentHandler::new(store),
            run_cleanup: RunCleanupHandler::new(cleanup),
        }
    }
}
