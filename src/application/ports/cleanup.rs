//! Cleanup Runner Port - 手动清理触发
//!
//! 周期清理由后台循环驱动；这里的端口供外层
//! 立即触发一轮完整清理并取回统计。

use async_trait::async_trait;
use serde::Serialize;

/// 清理统计
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStats {
    /// 本轮检查的记录总数
    pub checked_records: usize,
    /// TTL 过期的记录数
    pub expired_records: usize,
    /// 配额超限淘汰的记录数
    pub quota_evicted_records: usize,
    /// 实际删除的记录数
    pub deleted_records: usize,
    /// 删除的产物文件数
    pub deleted_files: usize,
    /// 删除的散落文件数
    pub orphan_files_deleted: usize,
    /// 删除失败次数（已记日志）
    pub failed_deletes: usize,
}

/// Cleanup Runner Port
#[async_trait]
pub trait CleanupRunnerPort: Send + Sync {
    /// 立即执行一轮完整清理
    async fn run_cleanup(&self) -> CleanupStats;
}
