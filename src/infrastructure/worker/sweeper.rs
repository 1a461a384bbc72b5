//! Retention Sweeper - 内容保留清理
//!
//! 周期执行一轮完整清理（启动后也先跑一次）：
//! 1. TTL 过期：未收藏且超龄的记录标记删除；
//! 2. 数量配额：音频 / 视频各自独立，未收藏记录超出上限时
//!    按创建时间删除最旧的超额部分（配额是硬上限，
//!    即使没有任何记录单独过期也会执行）；
//! 3. 删除：先删产物文件（输出 + 配音音频）再删记录，
//!    曾收藏过的记录在任何一轮都绝不入选；
//! 4. 散落文件：TTS 散件、temp_ 前缀文件、渲染临时目录里
//!    早已定稿的 task_ 文件。
//!
//! 单条删除失败只记日志，不中断整轮；非终态记录一律不碰，
//! 避免与在途定稿竞争。

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{
    CleanupRunnerPort, CleanupStats, ContentStorePort, MediaStoragePort,
};
use crate::config::RetentionConfig;
use crate::domain::{ContentRecord, ContentType};

/// 保留清理器
pub struct RetentionSweeper {
    config: RetentionConfig,
    store: Arc<dyn ContentStorePort>,
    media: Arc<dyn MediaStoragePort>,
    /// 音频目录（扫描 TTS 散件）
    audios_dir: PathBuf,
    /// 渲染临时目录（扫描 task_ 文件）
    temp_dir: PathBuf,
}

impl RetentionSweeper {
    pub fn new(
        config: RetentionConfig,
        store: Arc<dyn ContentStorePort>,
        media: Arc<dyn MediaStoragePort>,
        audios_dir: impl AsRef<Path>,
        temp_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            config,
            store,
            media,
            audios_dir: audios_dir.as_ref().to_path_buf(),
            temp_dir: temp_dir.as_ref().to_path_buf(),
        }
    }

    /// 周期运行（含启动清理）
    pub async fn run(self: Arc<Self>) {
        if !self.config.enabled {
            tracing::info!("Retention sweeper disabled");
            return;
        }

        tracing::info!(
            interval_secs = self.config.interval_secs,
            unfavorited_ttl_secs = self.config.unfavorited_ttl_secs,
            max_audio_files = self.config.max_audio_files,
            max_video_files = self.config.max_video_files,
            "Retention sweeper started"
        );

        if self.config.cleanup_on_startup {
            tokio::time::sleep(Duration::from_secs(self.config.startup_delay_secs)).await;
            self.sweep().await;
        }

        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // 第一个 tick 立即返回

        loop {
            ticker.tick().await;
            self.sweep().await;
        }
    }

    /// 执行一轮完整清理
    pub async fn sweep(&self) -> CleanupStats {
        let started = std::time::Instant::now();
        let mut stats = CleanupStats::default();

        self.sweep_records(&mut stats).await;
        self.sweep_tts_orphans(&mut stats).await;
        self.sweep_temp_prefixed(&mut stats).await;
        self.sweep_render_temp_dir(&mut stats).await;

        tracing::info!(
            deleted_records = stats.deleted_records,
            deleted_files = stats.deleted_files,
            orphan_files = stats.orphan_files_deleted,
            failed = stats.failed_deletes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Cleanup pass finished"
        );
        stats
    }

    /// TTL 过期 + 配额淘汰
    async fn sweep_records(&self, stats: &mut CleanupStats) {
        let records = match self.store.list().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list records for cleanup");
                return;
            }
        };
        stats.checked_records = records.len();

        let now = Utc::now();
        let ttl = self.config.unfavorited_ttl_secs as i64;

        let mut marked: Vec<&ContentRecord> = Vec::new();
        let mut marked_ids: HashSet<Uuid> = HashSet::new();

        // 清理候选：未收藏且已到终态。非终态记录不碰，
        // 曾收藏过的（含已取消收藏的）永久保留。
        let eligible: Vec<&ContentRecord> = records
            .iter()
            .filter(|r| !r.is_favorite && !r.ever_favorited && r.status.is_terminal())
            .collect();

        // Pass 1: TTL 过期
        for record in &eligible {
            if record.age_secs(now) > ttl && marked_ids.insert(record.id) {
                marked.push(record);
                stats.expired_records += 1;
            }
        }

        // Pass 2: 数量配额，音频 / 视频各自独立
        for (content_type, quota) in [
            (ContentType::Audio, self.config.max_audio_files),
            (ContentType::Video, self.config.max_video_files),
        ] {
            let mut of_type: Vec<&ContentRecord> = eligible
                .iter()
                .copied()
                .filter(|r| r.content_type == content_type)
                .collect();

            if of_type.len() <= quota {
                continue;
            }

            let excess = of_type.len() - quota;
            tracing::info!(
                content_type = content_type.as_str(),
                count = of_type.len(),
                quota = quota,
                excess = excess,
                "File quota exceeded, evicting oldest"
            );

            of_type.sort_by_key(|r| r.created_at);
            for record in of_type.into_iter().take(excess) {
                if marked_ids.insert(record.id) {
                    marked.push(record);
                    stats.quota_evicted_records += 1;
                }
            }
        }

        if marked.is_empty() {
            return;
        }

        tracing::info!(
            total = marked.len(),
            expired = stats.expired_records,
            quota_evicted = stats.quota_evicted_records,
            "Deleting retired content records"
        );

        // Pass 3: 删除，记录与产物文件一起走
        for record in marked {
            let deleted_files = self.delete_record_files(record, stats).await;
            stats.deleted_files += deleted_files;

            match self.store.remove(record.id).await {
                Ok(_) => stats.deleted_records += 1,
                Err(e) => {
                    stats.failed_deletes += 1;
                    tracing::warn!(record_id = %record.id, error = %e, "Failed to remove record");
                }
            }
        }
    }

    /// 删除记录的产物文件（输出 + 配音音频），返回删除数
    async fn delete_record_files(&self, record: &ContentRecord, stats: &mut CleanupStats) -> usize {
        let mut deleted = 0;
        for public_path in [record.output_path.as_deref(), record.audio_path.as_deref()]
            .into_iter()
            .flatten()
        {
            match self.media.remove_by_public_path(public_path).await {
                Ok(true) => deleted += 1,
                Ok(false) => {
                    // 文件早已不在，继续删记录即可
                    tracing::debug!(path = %public_path, "Artifact already absent");
                }
                Err(e) => {
                    stats.failed_deletes += 1;
                    tracing::warn!(path = %public_path, error = %e, "Failed to delete artifact file");
                }
            }
        }
        deleted
    }

    /// TTS 散件：audio_ / tts_ / video_audio_ 命名且未被任何记录引用
    async fn sweep_tts_orphans(&self, stats: &mut CleanupStats) {
        let records = match self.store.list().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list records for orphan sweep");
                return;
            }
        };

        let referenced: HashSet<String> = records
            .iter()
            .flat_map(|r| [r.output_path.as_deref(), r.audio_path.as_deref()])
            .flatten()
            .filter_map(|p| p.rsplit('/').next())
            .map(|s| s.to_string())
            .collect();

        let ttl = self.config.tts_file_ttl_secs as f64;
        self.sweep_dir(&self.audios_dir, stats, |name, age| {
            let is_tts_file = name.starts_with("audio_")
                || name.contains("tts_")
                || name.contains("video_audio_");
            is_tts_file && age > ttl && !referenced.contains(name)
        })
        .await;
    }

    /// temp_ 前缀的合成中间文件
    async fn sweep_temp_prefixed(&self, stats: &mut CleanupStats) {
        let ttl = self.config.temp_file_ttl_secs as f64;
        self.sweep_dir(&self.audios_dir, stats, |name, age| {
            name.starts_with("temp_") && age > ttl
        })
        .await;
    }

    /// 渲染临时目录：task_ 前缀且超龄意味着任务早已定稿
    async fn sweep_render_temp_dir(&self, stats: &mut CleanupStats) {
        let ttl = self.config.temp_file_ttl_secs as f64;
        self.sweep_dir(&self.temp_dir, stats, |name, age| {
            name.starts_with("task_") && age > ttl
        })
        .await;
    }

    /// 扫描目录，按谓词删除文件
    async fn sweep_dir<F>(&self, dir: &Path, stats: &mut CleanupStats, should_delete: F)
    where
        F: Fn(&str, f64) -> bool,
    {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Failed to read directory");
                return;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "Failed to iterate directory");
                    break;
                }
            };

            let path = entry.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };

            let age_secs = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata
                    .modified()
                    .ok()
                    .and_then(|mtime| mtime.elapsed().ok())
                    .map(|elapsed| elapsed.as_secs_f64()),
                _ => None,
            };
            let Some(age_secs) = age_secs else { continue };

            if !should_delete(&name, age_secs) {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    stats.orphan_files_deleted += 1;
                    tracing::debug!(file = %path.display(), "Deleted orphan file");
                }
                Err(e) => {
                    stats.failed_deletes += 1;
                    tracing::warn!(file = %path.display(), error = %e, "Failed to delete orphan file");
                }
            }
        }
    }
}

#[async_trait]
impl CleanupRunnerPort for RetentionSweeper {
    async fn run_cleanup(&self) -> CleanupStats {
        tracing::info!("Manual cleanup triggered");
        self.sweep().await
    }
}
