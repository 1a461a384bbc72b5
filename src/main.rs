//! Vocast - 语音 / 数字人视频生成编排服务
//!
//! 进程形态：常驻编排守护进程。
//! 启动顺序：配置 → 日志 → 目录 → 存储 → 网关 → Worker →
//! 启动恢复 → 保留清理 → 等待退出信号。
//! 对外操作（提交 / 查询 / 收藏 / 删除 / 清理）装配在
//! AppContext 中，由外层接入（CLI / HTTP，不在本服务范围内）调用。

use std::sync::Arc;

use vocast::application::commands::RenderOptions;
use vocast::application::AppContext;
use vocast::config::{load_config, print_config};
use vocast::infrastructure::adapters::{
    ArtifactLocator, FileMediaStorage, HttpRenderClient, HttpRenderClientConfig, HttpTtsClient,
    HttpTtsClientConfig, SymphoniaProbe,
};
use vocast::infrastructure::persistence::{JsonContentStore, JsonModelRepository};
use vocast::infrastructure::worker::{
    ChannelJobScheduler, GenerationWorker, GenerationWorkerConfig, PollConfig, PollWorker,
    ResultMaterializer, RetentionSweeper, StartupRecovery,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},vocast={}", config.log.level, config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Vocast - 语音 / 数字人视频生成编排服务");
    print_config(&config);

    // 确保数据目录存在
    tokio::fs::create_dir_all(config.storage.temp_path()).await?;

    // 打开文档存储
    let store = Arc::new(JsonContentStore::open(config.storage.contents_db_path()).await?);
    let model_repo = Arc::new(JsonModelRepository::open(config.storage.models_db_path()).await?);

    // 媒体存储与产物定位
    let media = Arc::new(
        FileMediaStorage::new(config.storage.audios_path(), config.storage.videos_path()).await?,
    );
    let locator = Arc::new(ArtifactLocator::new(
        &config.storage.data_dir,
        config.storage.video_search_dirs.clone(),
        config.storage.audio_search_dirs.clone(),
    ));

    // 外部提供方网关
    let tts_engine = Arc::new(HttpTtsClient::new(HttpTtsClientConfig {
        base_url: config.providers.tts.url.clone(),
        timeout_secs: config.providers.tts.timeout_secs,
    })?);
    let render_engine = Arc::new(HttpRenderClient::new(HttpRenderClientConfig {
        base_url: config.providers.render.url.clone(),
        submit_timeout_secs: config.providers.render.submit_timeout_secs,
        query_timeout_secs: config.providers.render.query_timeout_secs,
    })?);

    // 定稿器与轮询引擎
    let materializer = Arc::new(ResultMaterializer::new(
        store.clone(),
        media.clone(),
        locator,
        Arc::new(SymphoniaProbe::new()),
    ));
    let poll_worker = Arc::new(PollWorker::new(
        PollConfig::from_config(&config.polling),
        render_engine.clone(),
        store.clone(),
        materializer.clone(),
    ));

    // 生成队列与 Worker
    let (scheduler, queue_receiver) = ChannelJobScheduler::new(1000);
    let scheduler = Arc::new(scheduler);
    let worker = GenerationWorker::new(
        GenerationWorkerConfig::default(),
        queue_receiver,
        tts_engine.clone(),
        store.clone(),
        materializer.clone(),
        poll_worker.clone(),
    );
    tokio::spawn(worker.run());

    // 启动恢复：接上在途任务的轮询，修复不一致记录
    let recovery = StartupRecovery::new(store.clone(), media.clone(), poll_worker.clone());
    recovery.run().await?;

    // 保留清理
    let sweeper = Arc::new(RetentionSweeper::new(
        config.retention.clone(),
        store.clone(),
        media.clone(),
        config.storage.audios_path(),
        config.storage.temp_path(),
    ));
    tokio::spawn(sweeper.clone().run());

    // 对外操作装配；持有调度器发送端直到进程退出
    let _app = AppContext::new(
        store,
        model_repo,
        tts_engine,
        render_engine,
        media,
        scheduler,
        sweeper,
        RenderOptions {
            chaofen: config.providers.render.chaofen,
            watermark_switch: config.providers.render.watermark_switch,
            pn: config.providers.render.pn,
        },
    );

    tracing::info!("Vocast orchestrator running, press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal");

    Ok(())
}
