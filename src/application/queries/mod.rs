//! Application Queries - 查询与处理器

mod content_queries;
pub mod handlers;

pub use content_queries::{GetContentQuery, JobStatusQuery, JobStatusView, ListContentQuery};
pub use handlers::{GetContentHandler, JobStatusHandler, ListContentHandler};
