pub mod bili_api;
pub mod biliup;
pub mod ytdlp;

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;

pub use bili_api::BiliApiClient;
pub use biliup::BiliupUploader;
pub use ytdlp::YtDlpClient;

// ============ 公共常量 ============

/// 详情接口超时（秒）
pub const DETAIL_TIMEOUT_SECS: u64 = 30;

/// 空间列表中的一条视频
#[derive(Debug, Clone)]
pub struct RemoteVideo {
    pub id: String,
    pub title: String,
}

/// 单个视频的详情快照
#[derive(Debug, Clone)]
pub struct VideoDetail {
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub description: String,
    pub tags: Vec<String>,
}

/// 下载完成事件，携带传输时刻观察到的元数据
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
}

/// 补档投稿描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub video_path: PathBuf,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// 分区 id
    pub category_id: u32,
}

/// 远端单项操作错误，区分可恢复的逐项失败
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("视频不可访问: {0}")]
    NotFound(String),
    #[error("远端请求失败: {0}")]
    Unavailable(String),
    #[error("响应解析失败: {0}")]
    Parse(String),
}

/// 空间列表接口
#[async_trait]
pub trait RemoteListing: Send + Sync {
    /// 列出空间最新的 max_count 个视频
    async fn list_recent(&self, space_url: &str, max_count: usize) -> Result<Vec<RemoteVideo>>;
}

/// 单视频详情接口
#[async_trait]
pub trait RemoteDetail: Send + Sync {
    async fn video_detail(&self, id: &str) -> Result<VideoDetail, RemoteError>;
}

/// 批量下载接口。每个视频完成时通过 events 发送一条完成事件，
/// 事件之间的顺序不作保证
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch_batch(
        &self,
        urls: &[String],
        events: mpsc::UnboundedSender<FetchedMedia>,
    ) -> Result<()>;
}

/// 投稿接口
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, request: &PublishRequest) -> Result<()>;
}
