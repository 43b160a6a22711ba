use bilikeeper_lib::logging::{get_log_dir, LogConfig, RotatingFileWriter};
use bilikeeper_lib::remote::{
    BiliApiClient, BiliupUploader, MediaFetcher, Publisher, RemoteDetail, RemoteListing,
    YtDlpClient,
};
use bilikeeper_lib::{AppState, ReconcileEngine, VideoStore};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

/// 初始化日志系统：控制台 + 带轮转的文件日志
fn init_logging() {
    let log_dir = get_log_dir();
    let _ = std::fs::create_dir_all(&log_dir);

    let config = LogConfig::load(log_dir.parent().unwrap_or(&log_dir));

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(config.tracing_level().into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap())
        .add_directive("sqlx=warn".parse().unwrap());

    if config.enabled {
        if let Ok(file_writer) = RotatingFileWriter::new(&log_dir, config.max_size_mb) {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false);

            let console_layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false);

            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(console_layer);
            let _ = tracing::subscriber::set_global_default(subscriber);
            return;
        }
    }

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let state = AppState::new().await?;
    let config = state.config.clone();

    let store = VideoStore::new(state.db.clone());
    let ytdlp = Arc::new(YtDlpClient::new(
        &config.ytdlp_program,
        Path::new(&config.download_dir),
    ));
    let listing: Arc<dyn RemoteListing> = ytdlp.clone();
    let fetcher: Arc<dyn MediaFetcher> = ytdlp;
    let detail: Arc<dyn RemoteDetail> = Arc::new(BiliApiClient::new()?);
    let publisher: Arc<dyn Publisher> = Arc::new(BiliupUploader::new(&config.biliup_program));

    let engine = ReconcileEngine::new(store, listing, detail, fetcher, publisher, config);

    // 先对账，再补档，两个阶段顺序执行
    let cycle = engine.run_cycle().await?;
    let republish = engine.run_republish().await?;

    tracing::info!(
        "本轮结束: 列表 {}, 新下载 {}, 指标刷新 {}, 新失效 {}, 补档 {}, 跳过 {}",
        cycle.listed,
        cycle.fetched,
        cycle.refreshed,
        cycle.newly_vanished,
        republish.published,
        republish.skipped
    );
    if let Some(reason) = &republish.halted {
        tracing::warn!("补档批次提前中止: {}", reason);
    }

    state.cleanup().await;
    Ok(())
}
