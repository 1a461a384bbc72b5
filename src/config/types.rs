//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// 外部提供方配置
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 渲染任务轮询配置
    #[serde(default)]
    pub polling: PollingConfig,

    /// 内容保留 / 清理配置
    #[serde(default)]
    pub retention: RetentionConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 外部提供方配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub tts: TtsProviderConfig,

    #[serde(default)]
    pub render: RenderProviderConfig,
}

/// TTS 提供方配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsProviderConfig {
    /// TTS 网关基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 合成请求超时（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,
}

fn default_tts_url() -> String {
    "http://localhost:18180".to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

impl Default for TtsProviderConfig {
    fn default() -> Self {
        Self {
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
        }
    }
}

/// 渲染提供方配置
#[derive(Debug, Clone, Deserialize)]
pub struct RenderProviderConfig {
    /// 渲染服务基础 URL
    #[serde(default = "default_render_url")]
    pub url: String,

    /// 提交请求超时（秒）
    #[serde(default = "default_submit_timeout")]
    pub submit_timeout_secs: u64,

    /// 状态查询超时（秒）
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,

    /// 超分辨率开关
    #[serde(default)]
    pub chaofen: u8,

    /// 水印开关
    #[serde(default)]
    pub watermark_switch: u8,

    /// 处理编号
    #[serde(default = "default_pn")]
    pub pn: u8,
}

fn default_render_url() -> String {
    "http://localhost:8383/easy".to_string()
}

fn default_submit_timeout() -> u64 {
    30
}

fn default_query_timeout() -> u64 {
    10
}

fn default_pn() -> u8 {
    1
}

impl Default for RenderProviderConfig {
    fn default() -> Self {
        Self {
            url: default_render_url(),
            submit_timeout_secs: default_submit_timeout(),
            query_timeout_secs: default_query_timeout(),
            chaofen: 0,
            watermark_switch: 0,
            pn: default_pn(),
        }
    }
}

/// 存储配置
///
/// 所有子目录均相对 data_dir 解析。渲染产物的候选目录列表
/// 随部署拓扑不同而不同，因此做成可配置的有序搜索路径。
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 数据根目录
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// 音频产物目录（相对 data_dir）
    #[serde(default = "default_audios_dir")]
    pub audios_dir: String,

    /// 视频产物目录（相对 data_dir）
    #[serde(default = "default_videos_dir")]
    pub videos_dir: String,

    /// 渲染过程临时目录（相对 data_dir）
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,

    /// 内容记录文档路径（相对 data_dir）
    #[serde(default = "default_contents_db")]
    pub contents_db: String,

    /// 模型资产文档路径（相对 data_dir）
    #[serde(default = "default_models_db")]
    pub models_db: String,

    /// 渲染产物候选目录（按序探测，相对 data_dir）
    #[serde(default = "default_video_search_dirs")]
    pub video_search_dirs: Vec<String>,

    /// 音频文件候选目录（按序探测，相对 data_dir）
    #[serde(default = "default_audio_search_dirs")]
    pub audio_search_dirs: Vec<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_audios_dir() -> String {
    "audios".to_string()
}

fn default_videos_dir() -> String {
    "videos".to_string()
}

fn default_temp_dir() -> String {
    "temp".to_string()
}

fn default_contents_db() -> String {
    "database/contents.json".to_string()
}

fn default_models_db() -> String {
    "database/models.json".to_string()
}

fn default_video_search_dirs() -> Vec<String> {
    vec![
        "videos".to_string(),
        "temp".to_string(),
        "face2face/temp".to_string(),
        "result".to_string(),
    ]
}

fn default_audio_search_dirs() -> Vec<String> {
    vec![
        "audios".to_string(),
        "voice".to_string(),
        "uploads".to_string(),
    ]
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            audios_dir: default_audios_dir(),
            videos_dir: default_videos_dir(),
            temp_dir: default_temp_dir(),
            contents_db: default_contents_db(),
            models_db: default_models_db(),
            video_search_dirs: default_video_search_dirs(),
            audio_search_dirs: default_audio_search_dirs(),
        }
    }
}

impl StorageConfig {
    pub fn audios_path(&self) -> PathBuf {
        self.data_dir.join(&self.audios_dir)
    }

    pub fn videos_path(&self) -> PathBuf {
        self.data_dir.join(&self.videos_dir)
    }

    pub fn temp_path(&self) -> PathBuf {
        self.data_dir.join(&self.temp_dir)
    }

    pub fn contents_db_path(&self) -> PathBuf {
        self.data_dir.join(&self.contents_db)
    }

    pub fn models_db_path(&self) -> PathBuf {
        self.data_dir.join(&self.models_db)
    }
}

/// 渲染任务轮询配置
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// 提交后首次查询前的固定延迟（秒），覆盖提供方登记延迟
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,

    /// 进行中任务的查询间隔（秒）
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// 关联码未知时的重试间隔（秒）
    #[serde(default = "default_not_found_interval")]
    pub not_found_interval_secs: u64,

    /// 未知关联码 / 网络错误的重试上限，超出后对账并判超时
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_initial_delay() -> u64 {
    3
}

fn default_poll_interval() -> u64 {
    3
}

fn default_not_found_interval() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    60
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay(),
            poll_interval_secs: default_poll_interval(),
            not_found_interval_secs: default_not_found_interval(),
            max_retries: default_max_retries(),
        }
    }
}

/// 内容保留 / 清理配置
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// 是否启用周期清理
    #[serde(default = "default_retention_enabled")]
    pub enabled: bool,

    /// 清理间隔（秒）
    #[serde(default = "default_retention_interval")]
    pub interval_secs: u64,

    /// 启动后是否先执行一次清理
    #[serde(default = "default_cleanup_on_startup")]
    pub cleanup_on_startup: bool,

    /// 启动清理的延迟（秒），避免阻塞启动
    #[serde(default = "default_startup_delay")]
    pub startup_delay_secs: u64,

    /// 未收藏内容的存活时间（秒）
    #[serde(default = "default_unfavorited_ttl")]
    pub unfavorited_ttl_secs: u64,

    /// TTS 散落文件的存活时间（秒）
    #[serde(default = "default_tts_file_ttl")]
    pub tts_file_ttl_secs: u64,

    /// temp 文件的存活时间（秒）
    #[serde(default = "default_temp_file_ttl")]
    pub temp_file_ttl_secs: u64,

    /// 未收藏音频的数量上限
    #[serde(default = "default_max_audio_files")]
    pub max_audio_files: usize,

    /// 未收藏视频的数量上限
    #[serde(default = "default_max_video_files")]
    pub max_video_files: usize,
}

fn default_retention_enabled() -> bool {
    true
}

fn default_retention_interval() -> u64 {
    6 * 60 * 60 // 6 小时
}

fn default_cleanup_on_startup() -> bool {
    true
}

fn default_startup_delay() -> u64 {
    5
}

fn default_unfavorited_ttl() -> u64 {
    7 * 24 * 60 * 60 // 7 天，给用户充足时间决定是否收藏
}

fn default_tts_file_ttl() -> u64 {
    2 * 60 * 60 // 2 小时，避免生成过程中被删除
}

fn default_temp_file_ttl() -> u64 {
    60 * 60 // 1 小时，渲染处理需要较长时间
}

fn default_max_audio_files() -> usize {
    100
}

fn default_max_video_files() -> usize {
    50
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: default_retention_enabled(),
            interval_secs: default_retention_interval(),
            cleanup_on_startup: default_cleanup_on_startup(),
            startup_delay_secs: default_startup_delay(),
            unfavorited_ttl_secs: default_unfavorited_ttl(),
            tts_file_ttl_secs: default_tts_file_ttl(),
            temp_file_ttl_secs: default_temp_file_ttl(),
            max_audio_files: default_max_audio_files(),
            max_video_files: default_max_video_files(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
