//! File Media Storage - 规范媒体目录的文件系统实现
//!
//! 实现 MediaStoragePort trait。记录中只保存公开路径
//! （/audios/.. /videos/..，兼容旧 /uploads/..），这里负责双向映射。

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{MediaStorageError, MediaStoragePort};

/// 文件系统媒体存储
pub struct FileMediaStorage {
    audios_dir: PathBuf,
    videos_dir: PathBuf,
}

impl FileMediaStorage {
    /// 创建存储并确保目录存在
    pub async fn new(
        audios_dir: impl AsRef<Path>,
        videos_dir: impl AsRef<Path>,
    ) -> Result<Self, MediaStorageError> {
        let audios_dir = audios_dir.as_ref().to_path_buf();
        let videos_dir = videos_dir.as_ref().to_path_buf();

        for dir in [&audios_dir, &videos_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| MediaStorageError::IoError(e.to_string()))?;
        }

        Ok(Self {
            audios_dir,
            videos_dir,
        })
    }

    pub fn audios_dir(&self) -> &Path {
        &self.audios_dir
    }

    pub fn videos_dir(&self) -> &Path {
        &self.videos_dir
    }

    /// 公开路径里只接受纯文件名，防止目录穿越
    fn sanitize(name: &str) -> Option<&str> {
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return None;
        }
        Some(name)
    }
}

#[async_trait]
impl MediaStoragePort for FileMediaStorage {
    fn audio_file_path(&self, file_name: &str) -> PathBuf {
        self.audios_dir.join(file_name)
    }

    fn video_file_path(&self, file_name: &str) -> PathBuf {
        self.videos_dir.join(file_name)
    }

    fn public_audio_path(&self, file_name: &str) -> String {
        format!("/audios/{}", file_name)
    }

    fn public_video_path(&self, file_name: &str) -> String {
        format!("/videos/{}", file_name)
    }

    fn resolve_public_path(&self, public_path: &str) -> Option<PathBuf> {
        if let Some(name) = public_path.strip_prefix("/audios/") {
            return Self::sanitize(name).map(|n| self.audios_dir.join(n));
        }
        if let Some(name) = public_path.strip_prefix("/videos/") {
            return Self::sanitize(name).map(|n| self.videos_dir.join(n));
        }
        // 向后兼容：旧记录的 /uploads/ 路径指向音频目录
        if let Some(name) = public_path.strip_prefix("/uploads/") {
            return Self::sanitize(name).map(|n| self.audios_dir.join(n));
        }
        None
    }

    async fn save_audio(&self, file_name: &str, data: &[u8]) -> Result<PathBuf, MediaStorageError> {
        let path = self.audio_file_path(file_name);
        fs::write(&path, data)
            .await
            .map_err(|e| MediaStorageError::IoError(e.to_string()))?;

        tracing::debug!(
            file = %path.display(),
            size = data.len(),
            "Saved audio file"
        );
        Ok(path)
    }

    async fn remove_by_public_path(&self, public_path: &str) -> Result<bool, MediaStorageError> {
        let path = self
            .resolve_public_path(public_path)
            .ok_or_else(|| MediaStorageError::UnrecognizedPath(public_path.to_string()))?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(file = %path.display(), "Deleted media file");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MediaStorageError::IoError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage() -> (tempfile::TempDir, FileMediaStorage) {
        let dir = tempdir().unwrap();
        let storage = FileMediaStorage::new(dir.path().join("audios"), dir.path().join("videos"))
            .await
            .unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_save_and_remove_audio() {
        let (_dir, storage) = storage().await;

        let path = storage.save_audio("audio_1.wav", b"data").await.unwrap();
        assert!(path.exists());

        let removed = storage.remove_by_public_path("/audios/audio_1.wav").await.unwrap();
        assert!(removed);
        assert!(!path.exists());

        // 再删一次：文件已不存在，不报错
        let removed = storage.remove_by_public_path("/audios/audio_1.wav").await.unwrap();
        assert!(!removed);
    }

    #[tokio::test]
    async fn test_resolve_public_path_prefixes() {
        let (_dir, storage) = storage().await;

        assert_eq!(
            storage.resolve_public_path("/audios/a.wav"),
            Some(storage.audio_file_path("a.wav"))
        );
        assert_eq!(
            storage.resolve_public_path("/videos/v.mp4"),
            Some(storage.video_file_path("v.mp4"))
        );
        // 旧路径兼容
        assert_eq!(
            storage.resolve_public_path("/uploads/a.wav"),
            Some(storage.audio_file_path("a.wav"))
        );
        assert_eq!(storage.resolve_public_path("/elsewhere/a.wav"), None);
        // 目录穿越被拒绝
        assert_eq!(storage.resolve_public_path("/audios/../../etc/passwd"), None);
    }
}
