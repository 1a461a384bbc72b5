//! Content Query Handlers
//!
//! JobStatus 把提供方的原生状态码归一化成内部生命周期；
//! 记录一旦终态就直接由本地存储作答——重复查询是幂等的，
//! 不会重新触发定稿，也不会再打扰提供方。

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{ContentStorePort, RenderEnginePort, CODE_SUCCESS};
use crate::application::queries::content_queries::{
    GetContentQuery, JobStatusQuery, JobStatusView, ListContentQuery,
};
use crate::domain::{record_id_from_task_code, ContentRecord, ContentStatus};

/// JobStatus Handler - 任务状态查询
pub struct JobStatusHandler {
    store: Arc<dyn ContentStorePort>,
    render: Arc<dyn RenderEnginePort>,
}

impl JobStatusHandler {
    pub fn new(store: Arc<dyn ContentStorePort>, render: Arc<dyn RenderEnginePort>) -> Self {
        Self { store, render }
    }

    pub async fn handle(&self, query: JobStatusQuery) -> Result<JobStatusView, ApplicationError> {
        // 先按关联码查；查不到时从码里还原记录 id 兜底
        let record = match self.store.get_by_task_code(&query.task_code).await? {
            Some(record) => Some(record),
            None => match record_id_from_task_code(&query.task_code) {
                Some(id) => self.store.get(id).await?,
                None => None,
            },
        };

        // 终态由本地作答，不再触碰提供方
        if let Some(ref record) = record {
            if record.status.is_terminal() {
                return Ok(JobStatusView {
                    provider_code: CODE_SUCCESS,
                    status: record.status,
                    progress: record.progress,
                    result: record.output_path.clone(),
                });
            }
        }

        let reply = self
            .render
            .query(&query.task_code)
            .await
            .map_err(|e| ApplicationError::external(e.to_string()))?;

        // 归一化：完成 / 失败 / 忙 → 终态；未知码以本地记录为准；
        // 其余视为进行中。定稿始终由轮询引擎负责，这里只读。
        let status = if reply.is_complete() {
            ContentStatus::Completed
        } else if reply.is_render_failed() || reply.is_busy() {
            ContentStatus::Failed
        } else if reply.is_unknown_code() {
            record
                .as_ref()
                .map(|r| r.status)
                .unwrap_or(ContentStatus::Generating)
        } else {
            ContentStatus::Processing
        };

        Ok(JobStatusView {
            provider_code: reply.code,
            status,
            progress: reply.progress,
            result: reply.result,
        })
    }
}

/// GetContent Handler - 单条作品查询
pub struct GetContentHandler {
    store: Arc<dyn ContentStorePort>,
}

impl GetContentHandler {
    pub fn new(store: Arc<dyn ContentStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: GetContentQuery) -> Result<ContentRecord, ApplicationError> {
        self.store
            .get(query.record_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Content", query.record_id))
    }
}

/// ListContent Handler - 作品列表
pub struct ListContentHandler {
    store: Arc<dyn ContentStorePort>,
}

impl ListContentHandler {
    pub fn new(store: Arc<dyn ContentStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        _query: ListContentQuery,
    ) -> Result<Vec<ContentRecord>, ApplicationError> {
        Ok(self.store.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ContentPatch, ContentStorePort};
    use crate::infrastructure::adapters::render::{in_progress, unknown_code, FakeRenderClient};
    use crate::infrastructure::persistence::JsonContentStore;
    use tempfile::TempDir;
    use uuid::Uuid;

    async fn store() -> (TempDir, Arc<JsonContentStore>) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            JsonContentStore::open(dir.path().join("contents.json"))
                .await
                .unwrap(),
        );
        (dir, store)
    }

    async fn insert_video(store: &JsonContentStore) -> (Uuid, String) {
        let mut record = ContentRecord::new_video(
            String::new(),
            "face2face".to_string(),
            String::new(),
            Uuid::new_v4(),
        );
        let code = record.allocate_task_code();
        let id = record.id;
        store.insert(record).await.unwrap();
        (id, code)
    }

    #[tokio::test]
    async fn test_terminal_record_answered_locally() {
        let (_dir, store) = store().await;
        let render = Arc::new(FakeRenderClient::accepting(vec![unknown_code()]));

        let (id, code) = insert_video(&store).await;
        store
            .update(id, ContentPatch::completed("/videos/v.mp4".to_string(), 8))
            .await
            .unwrap();

        let handler = JobStatusHandler::new(store.clone(), render.clone());

        // 重复查询幂等，且完全不打扰提供方
        for _ in 0..3 {
            let view = handler
                .handle(JobStatusQuery {
                    task_code: code.clone(),
                })
                .await
                .unwrap();
            assert_eq!(view.status, ContentStatus::Completed);
            assert_eq!(view.progress, 100);
            assert_eq!(view.result.as_deref(), Some("/videos/v.mp4"));
        }
        assert_eq!(render.query_count(), 0);
    }

    #[tokio::test]
    async fn test_in_progress_proxied_from_provider() {
        let (_dir, store) = store().await;
        let render = Arc::new(FakeRenderClient::accepting(vec![in_progress(55)]));

        let (_id, code) = insert_video(&store).await;
        let handler = JobStatusHandler::new(store.clone(), render);

        let view = handler
            .handle(JobStatusQuery { task_code: code })
            .await
            .unwrap();
        assert_eq!(view.status, ContentStatus::Processing);
        assert_eq!(view.progress, 55);
    }

    #[tokio::test]
    async fn test_unknown_code_falls_back_to_record_status() {
        let (_dir, store) = store().await;
        let render = Arc::new(FakeRenderClient::accepting(vec![unknown_code()]));

        let (_id, code) = insert_video(&store).await;
        let handler = JobStatusHandler::new(store.clone(), render);

        let view = handler
            .handle(JobStatusQuery { task_code: code })
            .await
            .unwrap();
        // 提供方不认识关联码，以本地记录状态为准
        assert_eq!(view.status, ContentStatus::Generating);
    }

    #[tokio::test]
    async fn test_list_returns_newest_first() {
        let (_dir, store) = store().await;

        for i in 0..3 {
            let mut record = ContentRecord::new_audio(
                format!("文本 {}", i),
                "edgetts".to_string(),
                String::new(),
            );
            record.created_at = chrono::Utc::now() - chrono::Duration::seconds(100 - i);
            store.insert(record).await.unwrap();
        }

        let handler = ListContentHandler::new(store.clone());
        let all = handler.handle(ListContentQuery).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].created_at >= all[1].created_at);
        assert!(all[1].created_at >= all[2].created_at);
    }
}
