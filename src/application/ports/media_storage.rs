//! Media Storage Port - 规范媒体存储
//!
//! 音频 / 视频产物的落盘与删除，以及公开路径（/audios/.. /videos/..）
//! 和磁盘路径之间的映射。记录里只存公开路径，磁盘布局由实现决定。

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// 视频任务配音临时文件名（提交时写入，定稿时转正，
/// 清理按 video_audio_ 前缀识别散件）
pub fn companion_audio_name(record_id: uuid::Uuid) -> String {
    format!("video_audio_{}.wav", record_id)
}

/// 媒体存储错误
#[derive(Debug, Error)]
pub enum MediaStorageError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Unrecognized public path: {0}")]
    UnrecognizedPath(String),
}

/// Media Storage Port
#[async_trait]
pub trait MediaStoragePort: Send + Sync {
    /// 音频文件的磁盘路径
    fn audio_file_path(&self, file_name: &str) -> PathBuf;

    /// 视频文件的磁盘路径
    fn video_file_path(&self, file_name: &str) -> PathBuf;

    /// 音频文件的公开路径
    fn public_audio_path(&self, file_name: &str) -> String;

    /// 视频文件的公开路径
    fn public_video_path(&self, file_name: &str) -> String;

    /// 把公开路径映射回磁盘路径（含对旧 /uploads/ 前缀的兼容）
    fn resolve_public_path(&self, public_path: &str) -> Option<PathBuf>;

    /// 写入音频文件，返回磁盘路径
    async fn save_audio(&self, file_name: &str, data: &[u8]) -> Result<PathBuf, MediaStorageError>;

    /// 按公开路径删除文件；文件不存在返回 Ok(false)
    async fn remove_by_public_path(&self, public_path: &str) -> Result<bool, MediaStorageError>;
}
