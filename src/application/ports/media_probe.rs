//! Media Probe Port - 媒体时长探测
//!
//! 尽力而为：探测失败返回 None，调用方回退到默认时长，
//! 绝不因此阻塞记录定稿。

use std::path::Path;

/// Media Probe Port
pub trait MediaProbePort: Send + Sync {
    /// 探测媒体文件时长（秒）
    fn duration_secs(&self, path: &Path) -> Option<u32>;
}
