//! Content Context - 生成内容上下文

mod record;

pub use record::{record_id_from_task_code, ContentRecord, ContentStatus, ContentType};
