//! Artifact Locator - 渲染产物定位
//!
//! 渲染服务依部署拓扑不同会把产物放到不同目录
//! （本机直跑、容器挂载、旧版本布局），因此按配置注入的
//! 有序候选目录逐个探测，返回第一个命中。

use std::path::{Path, PathBuf};

/// 产物定位器
pub struct ArtifactLocator {
    data_dir: PathBuf,
    video_roots: Vec<String>,
    audio_roots: Vec<String>,
}

impl ArtifactLocator {
    pub fn new(
        data_dir: impl AsRef<Path>,
        video_roots: Vec<String>,
        audio_roots: Vec<String>,
    ) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            video_roots,
            audio_roots,
        }
    }

    /// 渲染产物的预期文件名
    pub fn render_output_name(task_code: &str) -> String {
        format!("{}-r.mp4", task_code)
    }

    /// 按关联码查找渲染产物
    pub fn find_render_output(&self, task_code: &str) -> Option<PathBuf> {
        self.find_in_roots(&self.video_roots, &Self::render_output_name(task_code))
    }

    /// 按文件名查找音频
    pub fn find_audio(&self, file_name: &str) -> Option<PathBuf> {
        self.find_in_roots(&self.audio_roots, file_name)
    }

    fn find_in_roots(&self, roots: &[String], file_name: &str) -> Option<PathBuf> {
        for root in roots {
            let candidate = self.data_dir.join(root).join(file_name);
            if candidate.is_file() {
                tracing::debug!(
                    file = %candidate.display(),
                    root = %root,
                    "Artifact located"
                );
                return Some(candidate);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn locator(data_dir: &Path) -> ArtifactLocator {
        ArtifactLocator::new(
            data_dir,
            vec![
                "videos".to_string(),
                "temp".to_string(),
                "result".to_string(),
            ],
            vec!["audios".to_string(), "voice".to_string()],
        )
    }

    #[test]
    fn test_find_render_output_in_later_root() {
        let dir = tempdir().unwrap();
        let result_dir = dir.path().join("result");
        std::fs::create_dir_all(&result_dir).unwrap();
        std::fs::write(result_dir.join("task_abc-r.mp4"), b"mp4").unwrap();

        let found = locator(dir.path()).find_render_output("task_abc").unwrap();
        assert_eq!(found, result_dir.join("task_abc-r.mp4"));
    }

    #[test]
    fn test_first_matching_root_wins() {
        let dir = tempdir().unwrap();
        for root in ["videos", "temp"] {
            let d = dir.path().join(root);
            std::fs::create_dir_all(&d).unwrap();
            std::fs::write(d.join("task_abc-r.mp4"), b"mp4").unwrap();
        }

        let found = locator(dir.path()).find_render_output("task_abc").unwrap();
        assert_eq!(found, dir.path().join("videos").join("task_abc-r.mp4"));
    }

    #[test]
    fn test_missing_artifact_returns_none() {
        let dir = tempdir().unwrap();
        assert!(locator(dir.path()).find_render_output("task_missing").is_none());
        assert!(locator(dir.path()).find_audio("missing.wav").is_none());
    }
}
