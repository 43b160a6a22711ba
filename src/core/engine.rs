//! 对账引擎 - 串起一轮快照对账和一轮补档
//!
//! 所有外部调用严格串行，整轮只有一个写入者。每条记录的写入
//! 都是独立落盘的，分类又在每轮从头重算，所以中途崩溃后重跑
//! 会得到相同的集合，已处理的 id 被状态排除，天然可恢复。

use crate::config::AppConfig;
use crate::core::comparator::{classify, SnapshotDiff};
use crate::core::fetcher::FetchPlanner;
use crate::core::refresher::MetricsRefresher;
use crate::core::republisher::{RepublishOutcome, RepublishPlanner};
use crate::db::{VideoStatus, VideoStore};
use crate::remote::{MediaFetcher, Publisher, RemoteDetail, RemoteListing};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// 一轮对账的结果
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub listed: u32,
    pub unseen: u32,
    pub still_online: u32,
    pub newly_vanished: u32,
    pub refreshed: u32,
    pub refresh_failed: u32,
    pub fetched: u32,
}

/// 一轮补档的结果
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepublishReport {
    pub published: u32,
    pub skipped: u32,
    pub halted: Option<String>,
}

pub struct ReconcileEngine {
    store: VideoStore,
    listing: Arc<dyn RemoteListing>,
    detail: Arc<dyn RemoteDetail>,
    fetcher: Arc<dyn MediaFetcher>,
    publisher: Arc<dyn Publisher>,
    config: AppConfig,
}

impl ReconcileEngine {
    pub fn new(
        store: VideoStore,
        listing: Arc<dyn RemoteListing>,
        detail: Arc<dyn RemoteDetail>,
        fetcher: Arc<dyn MediaFetcher>,
        publisher: Arc<dyn Publisher>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            listing,
            detail,
            fetcher,
            publisher,
            config,
        }
    }

    /// 运行一轮对账：列表 -> 分类 -> 标记失效 -> 刷新指标 -> 下载新视频
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        info!("开始对账: {}", self.config.space_url);

        // 列表拉取失败整轮无法分类，直接中止
        let listed = self
            .listing
            .list_recent(&self.config.space_url, self.config.max_recent)
            .await
            .context("获取空间列表失败")?;

        let remote_ids: HashSet<String> = listed.iter().map(|v| v.id.clone()).collect();
        let known = self.store.get_all_statuses().await?;

        let diff = classify(&remote_ids, &known);
        info!(
            "分类完成: 新视频 {}, 在线 {}, 新失效 {}",
            diff.unseen.len(),
            diff.still_online.len(),
            diff.newly_vanished.len()
        );

        self.mark_vanished(&diff).await?;

        let refresher = MetricsRefresher::new(self.store.clone(), self.detail.clone());
        let refresh = refresher.refresh_all(&diff.still_online).await?;

        let planner = FetchPlanner::new(self.store.clone(), self.fetcher.clone());
        let fetch = planner.fetch_unseen(&diff.unseen).await?;

        let report = CycleReport {
            listed: listed.len() as u32,
            unseen: diff.unseen.len() as u32,
            still_online: diff.still_online.len() as u32,
            newly_vanished: diff.newly_vanished.len() as u32,
            refreshed: refresh.refreshed,
            refresh_failed: refresh.failed,
            fetched: fetch.fetched,
        };

        info!(
            "对账完成: 下载 {}, 刷新 {} (失败 {}), 新失效 {}",
            report.fetched, report.refreshed, report.refresh_failed, report.newly_vanished
        );

        Ok(report)
    }

    /// 运行一轮补档（通常作为对账之后的独立阶段）
    pub async fn run_republish(&self) -> Result<RepublishReport> {
        let planner = RepublishPlanner::new(
            self.store.clone(),
            self.publisher.clone(),
            self.config.clone(),
        );
        let RepublishOutcome {
            published,
            skipped,
            halted,
        } = planner.run().await?;

        info!("补档完成: 成功 {}, 跳过 {}", published, skipped);

        Ok(RepublishReport {
            published,
            skipped,
            halted,
        })
    }

    async fn mark_vanished(&self, diff: &SnapshotDiff) -> Result<()> {
        for id in &diff.newly_vanished {
            info!("视频已失效: {}", id);
            self.store.update_status(id, VideoStatus::Vanished).await?;
        }
        Ok(())
    }
}
