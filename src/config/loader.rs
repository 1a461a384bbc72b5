//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOCAST_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOCAST_PROVIDERS__TTS__URL=http://tts-gateway:18180`
/// - `VOCAST_PROVIDERS__RENDER__URL=http://render:8383/easy`
/// - `VOCAST_STORAGE__DATA_DIR=/srv/vocast/data`
/// - `VOCAST_RETENTION__MAX_AUDIO_FILES=200`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("providers.tts.url", "http://localhost:18180")?
        .set_default("providers.tts.timeout_secs", 120)?
        .set_default("providers.render.url", "http://localhost:8383/easy")?
        .set_default("providers.render.submit_timeout_secs", 30)?
        .set_default("providers.render.query_timeout_secs", 10)?
        .set_default("providers.render.chaofen", 0)?
        .set_default("providers.render.watermark_switch", 0)?
        .set_default("providers.render.pn", 1)?
        .set_default("storage.data_dir", "data")?
        .set_default("storage.audios_dir", "audios")?
        .set_default("storage.videos_dir", "videos")?
        .set_default("storage.temp_dir", "temp")?
        .set_default("storage.contents_db", "database/contents.json")?
        .set_default("storage.models_db", "database/models.json")?
        .set_default(
            "storage.video_search_dirs",
            vec!["videos", "temp", "face2face/temp", "result"],
        )?
        .set_default("storage.audio_search_dirs", vec!["audios", "voice", "uploads"])?
        .set_default("polling.initial_delay_secs", 3)?
        .set_default("polling.poll_interval_secs", 3)?
        .set_default("polling.not_found_interval_secs", 5)?
        .set_default("polling.max_retries", 60)?
        .set_default("retention.enabled", true)?
        .set_default("retention.interval_secs", 6 * 60 * 60)?
        .set_default("retention.cleanup_on_startup", true)?
        .set_default("retention.startup_delay_secs", 5)?
        .set_default("retention.unfavorited_ttl_secs", 7 * 24 * 60 * 60)?
        .set_default("retention.tts_file_ttl_secs", 2 * 60 * 60)?
        .set_default("retention.temp_file_ttl_secs", 60 * 60)?
        .set_default("retention.max_audio_files", 100)?
        .set_default("retention.max_video_files", 50)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 前缀: VOCAST_，层级分隔符: __ (双下划线)
    builder = builder.add_source(
        Environment::with_prefix("VOCAST")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.providers.tts.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS provider URL cannot be empty".to_string(),
        ));
    }

    if config.providers.render.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Render provider URL cannot be empty".to_string(),
        ));
    }

    if config.polling.max_retries == 0 {
        return Err(ConfigError::ValidationError(
            "Polling max_retries cannot be 0".to_string(),
        ));
    }

    if config.retention.enabled && config.retention.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Retention interval cannot be 0 when retention is enabled".to_string(),
        ));
    }

    if config.retention.max_audio_files == 0 || config.retention.max_video_files == 0 {
        return Err(ConfigError::ValidationError(
            "Retention file quotas cannot be 0".to_string(),
        ));
    }

    if config.storage.video_search_dirs.is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.video_search_dirs cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("TTS URL: {}", config.providers.tts.url);
    tracing::info!("Render URL: {}", config.providers.render.url);
    tracing::info!("Data Directory: {:?}", config.storage.data_dir);
    tracing::info!("Contents DB: {:?}", config.storage.contents_db_path());
    tracing::info!(
        "Polling: every {}s, not-found retry {}s, max {} retries",
        config.polling.poll_interval_secs,
        config.polling.not_found_interval_secs,
        config.polling.max_retries
    );
    tracing::info!("Retention Enabled: {}", config.retention.enabled);
    if config.retention.enabled {
        tracing::info!("Retention Interval: {}s", config.retention.interval_secs);
        tracing::info!(
            "Unfavorited TTL: {}s, quotas: {} audio / {} video",
            config.retention.unfavorited_ttl_secs,
            config.retention.max_audio_files,
            config.retention.max_video_files
        );
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_passes_for_default_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_empty_tts_url() {
        let mut config = AppConfig::default();
        config.providers.tts.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_retries() {
        let mut config = AppConfig::default();
        config.polling.max_retries = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_quota() {
        let mut config = AppConfig::default();
        config.retention.max_video_files = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_config_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[providers.render]
url = "http://render-host:9000/easy"

[retention]
max_audio_files = 7
"#,
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.providers.render.url, "http://render-host:9000/easy");
        assert_eq!(config.retention.max_audio_files, 7);
        // 未覆盖的键保持默认
        assert_eq!(config.polling.poll_interval_secs, 3);
    }
}
