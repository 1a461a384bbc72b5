//! Query Handlers

mod content_query_handlers;

pub use content_query_handlers::{GetContentHandler, JobStatusHandler, ListContentHandler};
