//! Infrastructure Adapters - 出站端口实现

pub mod probe;
pub mod render;
pub mod storage;
pub mod tts;

pub use probe::{FixedProbe, SymphoniaProbe};
pub use render::{FakeRenderClient, HttpRenderClient, HttpRenderClientConfig};
pub use storage::{ArtifactLocator, FileMediaStorage};
pub use tts::{FakeTtsClient, FakeTtsClientConfig, HttpTtsClient, HttpTtsClientConfig};
