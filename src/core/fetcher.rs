//! 下载规划 - 为无记录的新视频生成 URL 并提交批量下载

use crate::db::{VideoRecord, VideoStatus, VideoStore};
use crate::remote::MediaFetcher;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// 由 BV 号生成视频页 URL
pub fn video_url(id: &str) -> String {
    format!("https://www.bilibili.com/video/{}", id)
}

/// 下载结果统计
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub fetched: u32,
    /// 批量下载进程整体报错时的描述（已完成的条目仍然入库）
    pub batch_error: Option<String>,
}

pub struct FetchPlanner {
    store: VideoStore,
    fetcher: Arc<dyn MediaFetcher>,
}

impl FetchPlanner {
    pub fn new(store: VideoStore, fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self { store, fetcher }
    }

    /// 提交整批下载并消费完成事件，每条事件恰好触发一次 upsert。
    /// 事件到达顺序不作假设
    pub async fn fetch_unseen(&self, ids: &[String]) -> Result<FetchOutcome> {
        let mut outcome = FetchOutcome::default();

        if ids.is_empty() {
            info!("没有新视频，无需下载");
            return Ok(outcome);
        }

        let urls: Vec<String> = ids.iter().map(|id| video_url(id)).collect();
        info!("准备下载 {} 个新视频...", urls.len());

        let (tx, mut rx) = mpsc::unbounded_channel();
        let batch_result = self.fetcher.fetch_batch(&urls, tx).await;

        let now = chrono::Utc::now().timestamp();
        while let Some(media) = rx.recv().await {
            let record = VideoRecord {
                id: media.id,
                title: media.title,
                status: VideoStatus::Online,
                description: media.description,
                tags: media.tags,
                view_count: media.view_count,
                like_count: media.like_count,
                comment_count: media.comment_count,
                first_seen: now,
                last_checked: now,
            };
            self.store.upsert(&record).await?;
            info!("下载完成: {} ({})", record.title, record.id);
            outcome.fetched += 1;
        }

        if let Err(e) = batch_result {
            warn!("批量下载未全部完成: {}", e);
            outcome.batch_error = Some(e.to_string());
        }

        Ok(outcome)
    }
}
