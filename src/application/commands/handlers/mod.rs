//! Command Handlers

mod generate_handlers;
mod library_handlers;

pub use generate_handlers::{SubmitAudioHandler, SubmitVideoHandler};
pub use library_handlers::{DeleteContentHandler, RunCleanupHandler, ToggleFavoriteHandler};
