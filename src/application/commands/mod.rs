//! Application Commands - 命令与处理器

mod content_commands;
pub mod handlers;

pub use content_commands::{
    DeleteContentCommand, RenderOptions, SubmitAudioCommand, SubmitContentResponse,
    SubmitVideoCommand, ToggleFavoriteCommand,
};
pub use handlers::{
    DeleteContentHandler, RunCleanupHandler, SubmitAudioHandler, SubmitVideoHandler,
    ToggleFavoriteHandler,
};
