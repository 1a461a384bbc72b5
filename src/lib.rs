//! Vocast - 语音 / 数字人视频生成编排服务
//!
//! 架构: Ports & Adapters
//!
//! 领域层 (domain/):
//! - Content Context: 生成内容记录与状态机
//! - Model Asset: 音色 / 形象资产
//!
//! 应用层 (application/):
//! - Ports: 端口定义（ContentStore, TtsEngine, RenderEngine, ModelRepository,
//!   MediaStorage, MediaProbe, JobScheduler）
//! - Commands: 提交 / 收藏 / 删除处理器
//! - Queries: 任务状态 / 作品列表查询
//!
//! 基础设施层 (infrastructure/):
//! - Persistence: JSON 文档存储（原子落盘）
//! - Adapters: TTS / 渲染 HTTP 客户端、媒体存储、产物定位、时长探测
//! - Worker: 生成队列消费、渲染轮询、产物落库、保留清理、启动恢复

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
