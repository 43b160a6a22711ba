use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub mod config;
pub mod core;
pub mod db;
pub mod logging;
pub mod remote;

pub use config::AppConfig;
pub use core::{CycleReport, ReconcileEngine, RepublishReport};
pub use db::models::{VideoRecord, VideoStatus};
pub use db::VideoStore;

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub config: AppConfig,
    pub config_dir: PathBuf,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config_dir = dirs::config_dir()
            .map(|p| p.join("bilikeeper"))
            .unwrap_or_else(|| PathBuf::from(".bilikeeper"));

        std::fs::create_dir_all(&config_dir)?;

        let config = AppConfig::load(&config_dir);
        std::fs::create_dir_all(&config.download_dir)?;

        // 初始化数据库（带连接池配置）
        let db_path = config_dir.join("bilikeeper.db");
        // SQLite 连接字符串格式: sqlite://path 或 sqlite:path
        // Windows 路径需要转换反斜杠为正斜杠
        let db_path_str = db_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid database path"))?
            .replace('\\', "/");

        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&format!("sqlite:{}?mode=rwc", db_path_str))
            .await?;

        // 运行数据库迁移
        sqlx::migrate!("./migrations").run(&db).await?;

        Ok(Self {
            db: Arc::new(db),
            config,
            config_dir,
        })
    }

    /// 关闭连接池（退出前调用）
    pub async fn cleanup(&self) {
        tracing::debug!("关闭数据库连接池...");
        self.db.close().await;
    }
}

// 平台配置目录
pub mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        if cfg!(target_os = "windows") {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library").join("Application Support"))
        } else {
            // Linux
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        }
    }
}
