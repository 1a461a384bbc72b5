//! Content Queries - 任务状态 / 作品查询定义

use uuid::Uuid;

use crate::domain::ContentStatus;

/// 按关联码查询任务状态
#[derive(Debug, Clone)]
pub struct JobStatusQuery {
    pub task_code: String,
}

/// 任务状态视图：提供方原生码 + 归一化后的内部状态
#[derive(Debug, Clone)]
pub struct JobStatusView {
    /// 提供方信封码（10000 / 10001 / 10004 / ...）
    pub provider_code: i32,
    pub status: ContentStatus,
    pub progress: u8,
    /// 产物引用：终态记录为公开路径，否则为提供方回报的文件名
    pub result: Option<String>,
}

/// 按 id 查询单条作品
#[derive(Debug, Clone)]
pub struct GetContentQuery {
    pub record_id: Uuid,
}

/// 作品列表（创建时间倒序）
#[derive(Debug, Clone, Default)]
pub struct ListContentQuery;
