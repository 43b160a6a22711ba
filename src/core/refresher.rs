//! 指标刷新 - 对仍在线的视频回写最新统计

use crate::db::{StatUpdate, VideoStore};
use crate::remote::RemoteDetail;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// 刷新结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub refreshed: u32,
    pub failed: u32,
}

pub struct MetricsRefresher {
    store: VideoStore,
    detail: Arc<dyn RemoteDetail>,
}

impl MetricsRefresher {
    pub fn new(store: VideoStore, detail: Arc<dyn RemoteDetail>) -> Self {
        Self { store, detail }
    }

    /// 逐个刷新。单个视频的详情拉取失败只记录并继续，
    /// 存储写入失败则中止整个周期
    pub async fn refresh_all(&self, ids: &[String]) -> Result<RefreshOutcome> {
        let mut outcome = RefreshOutcome::default();

        for id in ids {
            let detail = match self.detail.video_detail(id).await {
                Ok(d) => d,
                Err(e) => {
                    warn!("刷新指标失败，跳过 {}: {}", id, e);
                    outcome.failed += 1;
                    continue;
                }
            };

            self.store
                .update_stats(
                    id,
                    &StatUpdate {
                        view_count: detail.view_count,
                        like_count: detail.like_count,
                        comment_count: detail.comment_count,
                        checked_at: chrono::Utc::now().timestamp(),
                    },
                )
                .await?;

            debug!(
                "已刷新 {}: 播放 {} 点赞 {} 评论 {}",
                id, detail.view_count, detail.like_count, detail.comment_count
            );
            outcome.refreshed += 1;
        }

        Ok(outcome)
    }
}
