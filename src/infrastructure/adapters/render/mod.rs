//! Render Adapters - 数字人渲染服务适配器

mod fake_render_client;
mod http_render_client;

pub use fake_render_client::{
    complete, in_progress, render_failed, unknown_code, FakeRenderClient, ScriptedReply,
};
pub use http_render_client::{HttpRenderClient, HttpRenderClientConfig};
