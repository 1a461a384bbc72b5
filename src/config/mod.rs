//! Configuration Module - 配置管理
//!
//! 支持多源配置：默认值 → 配置文件 → 环境变量

mod loader;
mod types;

pub use loader::{load_config, load_config_from_path, print_config, ConfigError};
pub use types::{
    AppConfig, LogConfig, PollingConfig, ProvidersConfig, RenderProviderConfig, RetentionConfig,
    StorageConfig, TtsProviderConfig,
};
