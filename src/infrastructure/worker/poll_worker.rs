//! Poll Worker - 渲染任务状态轮询
//!
//! 每个在途任务一个独立的轮询循环，循环内严格串行：
//! 上一轮查询（含其触发的定稿）完成前不会发起下一轮。
//! 不同任务的循环互不相关。
//!
//! 提供方的 10004（关联码未知）无法区分「尚未登记」和
//! 「已完成并被清理」，因此有界重试；重试耗尽后先回读本地
//! 存储对账——若记录已由其他路径完成则直接收手，避免用
//! 超时失败覆盖真实的完成。

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::application::ports::{ContentPatch, ContentStorePort, RenderEnginePort, StoreError};
use crate::config::PollingConfig;

use super::materializer::ResultMaterializer;

/// 轮询配置
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// 提交后首次查询前的延迟
    pub initial_delay: Duration,
    /// 进行中任务的查询间隔
    pub poll_interval: Duration,
    /// 关联码未知 / 网络错误时的重试间隔
    pub not_found_interval: Duration,
    /// 重试上限
    pub max_retries: u32,
}

impl PollConfig {
    pub fn from_config(config: &PollingConfig) -> Self {
        Self {
            initial_delay: Duration::from_secs(config.initial_delay_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            not_found_interval: Duration::from_secs(config.not_found_interval_secs),
            max_retries: config.max_retries,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}

/// 单次轮询的推进结果
enum Tick {
    /// 继续轮询，等待指定间隔
    Continue(Duration),
    /// 循环结束（终态或记录已不存在）
    Stop,
}

/// 渲染轮询 Worker
pub struct PollWorker {
    config: PollConfig,
    render: Arc<dyn RenderEnginePort>,
    store: Arc<dyn ContentStorePort>,
    materializer: Arc<ResultMaterializer>,
    /// 在途关联码注册表，防止同一任务起两个循环
    active: DashMap<String, ()>,
}

impl PollWorker {
    pub fn new(
        config: PollConfig,
        render: Arc<dyn RenderEnginePort>,
        store: Arc<dyn ContentStorePort>,
        materializer: Arc<ResultMaterializer>,
    ) -> Self {
        Self {
            config,
            render,
            store,
            materializer,
            active: DashMap::new(),
        }
    }

    /// 是否有该关联码的在途循环
    pub fn is_watching(&self, task_code: &str) -> bool {
        self.active.contains_key(task_code)
    }

    /// 为任务启动轮询循环
    pub fn spawn(self: Arc<Self>, record_id: Uuid, task_code: String) -> Option<JoinHandle<()>> {
        if self.active.insert(task_code.clone(), ()).is_some() {
            tracing::warn!(task_code = %task_code, "Poll loop already active, skipping");
            return None;
        }

        let worker = self;
        Some(tokio::spawn(async move {
            worker.drive(record_id, &task_code).await;
            worker.active.remove(&task_code);
        }))
    }

    /// 驱动单个任务直至终态
    async fn drive(&self, record_id: Uuid, task_code: &str) {
        tracing::info!(
            record_id = %record_id,
            task_code = %task_code,
            "Poll loop started"
        );

        // 覆盖提供方的任务登记延迟
        tokio::time::sleep(self.config.initial_delay).await;

        let mut retries = 0u32;
        loop {
            match self.tick(record_id, task_code, &mut retries).await {
                Tick::Continue(delay) => tokio::time::sleep(delay).await,
                Tick::Stop => break,
            }
        }

        tracing::info!(
            record_id = %record_id,
            task_code = %task_code,
            "Poll loop finished"
        );
    }

    async fn tick(&self, record_id: Uuid, task_code: &str, retries: &mut u32) -> Tick {
        let reply = match self.render.query(task_code).await {
            Ok(reply) => reply,
            Err(e) => {
                // 传输错误与关联码未知同样处理：有界重试
                tracing::warn!(
                    task_code = %task_code,
                    retries = *retries,
                    error = %e,
                    "Render status query failed"
                );
                return self.bump_retries(record_id, retries).await;
            }
        };

        if reply.is_complete() {
            // result 已校验非空；定稿失败已在内部把记录改判 failed
            if let Err(e) = self.materializer.finalize_render(record_id, task_code).await {
                tracing::error!(
                    record_id = %record_id,
                    task_code = %task_code,
                    error = %e,
                    "Materialization failed"
                );
            }
            return Tick::Stop;
        }

        if reply.is_render_failed() {
            self.mark_failed(
                record_id,
                format!("Render failed: {}", reply.message),
            )
            .await;
            return Tick::Stop;
        }

        if reply.is_busy() {
            // 提供方明确拒绝，本次提交终结，不自动重试
            self.mark_failed(
                record_id,
                format!("Render service busy: {}", reply.message),
            )
            .await;
            return Tick::Stop;
        }

        if reply.is_unknown_code() {
            return self.bump_retries(record_id, retries).await;
        }

        if reply.code != crate::application::ports::CODE_SUCCESS {
            // 未识别的信封码按未知关联码处理：有界重试
            tracing::warn!(
                task_code = %task_code,
                reply_code = reply.code,
                "Unrecognized render reply code"
            );
            return self.bump_retries(record_id, retries).await;
        }

        // 进行中：更新进度，重置重试计数
        *retries = 0;
        match self
            .store
            .update(record_id, ContentPatch::processing(reply.progress))
            .await
        {
            Ok(_) => Tick::Continue(self.config.poll_interval),
            Err(StoreError::NotFound(_)) => {
                // 记录已被删除，没有继续轮询的意义
                tracing::warn!(record_id = %record_id, "Record gone, stopping poll loop");
                Tick::Stop
            }
            Err(StoreError::InvalidTransition { .. }) => {
                // 其他路径已把记录推到终态
                Tick::Stop
            }
            Err(e) => {
                tracing::error!(record_id = %record_id, error = %e, "Failed to update progress");
                Tick::Continue(self.config.poll_interval)
            }
        }
    }

    async fn bump_retries(&self, record_id: Uuid, retries: &mut u32) -> Tick {
        *retries += 1;
        if *retries < self.config.max_retries {
            return Tick::Continue(self.config.not_found_interval);
        }

        // 重试耗尽：对账后才允许判超时
        self.reconcile_timeout(record_id).await;
        Tick::Stop
    }

    /// 超时对账：10004 可能意味着任务早已完成并被提供方清理，
    /// 以本地存储为准，已终态则静默收手。
    async fn reconcile_timeout(&self, record_id: Uuid) {
        match self.store.get(record_id).await {
            Ok(Some(record)) if record.status.is_terminal() => {
                tracing::info!(
                    record_id = %record_id,
                    status = record.status.as_str(),
                    "Record already terminal after retry budget, leaving as-is"
                );
            }
            Ok(Some(_)) => {
                tracing::warn!(record_id = %record_id, "Polling retry budget exhausted, marking failed");
                self.mark_failed(record_id, "Render status polling timed out".to_string())
                    .await;
            }
            Ok(None) => {
                tracing::warn!(record_id = %record_id, "Record gone during timeout reconciliation");
            }
            Err(e) => {
                tracing::error!(record_id = %record_id, error = %e, "Timeout reconciliation read failed");
            }
        }
    }

    async fn mark_failed(&self, record_id: Uuid, message: String) {
        match self
            .store
            .update(record_id, ContentPatch::failed(message))
            .await
        {
            Ok(_) => {}
            Err(StoreError::InvalidTransition { .. }) | Err(StoreError::NotFound(_)) => {
                // 已终态或已删除，保持现状
            }
            Err(e) => {
                tracing::error!(record_id = %record_id, error = %e, "Failed to mark record failed");
            }
        }
    }
}
