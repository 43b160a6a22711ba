//! 补档规划 - 为失效视频逐个重新投稿
//!
//! 串行执行，成功后固定冷却，失败即停：外部投稿端有频率限制，
//! 连续失败时继续提交只会被持续拒绝。

use crate::config::AppConfig;
use crate::db::{VideoRecord, VideoStatus, VideoStore};
use crate::remote::{PublishRequest, Publisher};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// 本地文件扩展名探测顺序
const EXT_CANDIDATES: [&str; 4] = ["mp4", "flv", "mkv", "webm"];
/// 补档标题前缀
pub const REPUBLISH_TITLE_PREFIX: &str = "[补档] ";
/// 补档标记标签
pub const REPUBLISH_TAG: &str = "补档";

/// 补档结果统计
#[derive(Debug, Clone, Default)]
pub struct RepublishOutcome {
    pub published: u32,
    pub skipped: u32,
    /// 投稿失败导致批次中止时的描述
    pub halted: Option<String>,
}

pub struct RepublishPlanner {
    store: VideoStore,
    publisher: Arc<dyn Publisher>,
    config: AppConfig,
}

impl RepublishPlanner {
    pub fn new(store: VideoStore, publisher: Arc<dyn Publisher>, config: AppConfig) -> Self {
        Self {
            store,
            publisher,
            config,
        }
    }

    /// 处理全部失效视频。没有本地文件的条目跳过；
    /// 投稿失败立即中止剩余批次
    pub async fn run(&self) -> Result<RepublishOutcome> {
        let mut outcome = RepublishOutcome::default();
        let vanished = self.store.list_by_status(VideoStatus::Vanished).await?;

        if vanished.is_empty() {
            info!("没有待补档的视频");
            return Ok(outcome);
        }

        info!("发现 {} 个待补档视频", vanished.len());

        for record in &vanished {
            let path = match locate_media_file(
                Path::new(&self.config.download_dir),
                &record.title,
                &record.id,
            ) {
                Some(p) => p,
                None => {
                    info!("本地没有 {} 的文件，暂不补档", record.id);
                    outcome.skipped += 1;
                    continue;
                }
            };

            let request = build_publish_request(record, path, self.config.category_id);
            info!("补档投稿: {} ({})", request.title, record.id);

            if let Err(e) = self.publisher.publish(&request).await {
                error!("投稿失败，中止本轮补档: {} - {}", record.id, e);
                outcome.halted = Some(format!("{}: {}", record.id, e));
                break;
            }

            self.store
                .update_status(&record.id, VideoStatus::Republished)
                .await?;
            outcome.published += 1;
            info!("补档完成: {}", record.id);

            // 投稿端限流，成功后固定冷却
            tokio::time::sleep(Duration::from_secs(self.config.cooldown_secs)).await;
        }

        Ok(outcome)
    }
}

/// 把标题里文件系统不接受的字符替换掉，与下载时的命名规则一致
fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

/// 按固定扩展名顺序探测 `{标题} [{id}].{ext}`
pub fn locate_media_file(download_dir: &Path, title: &str, id: &str) -> Option<PathBuf> {
    let stem = format!("{} [{}]", sanitize_title(title), id);
    for ext in EXT_CANDIDATES {
        let candidate = download_dir.join(format!("{}.{}", stem, ext));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// 组装投稿描述：标记前缀 + 原始元数据快照
pub fn build_publish_request(
    record: &VideoRecord,
    video_path: PathBuf,
    category_id: u32,
) -> PublishRequest {
    let checked = chrono::DateTime::from_timestamp(record.last_checked, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| record.last_checked.to_string());

    let description = format!(
        "{}\n\n[补档说明] 原视频已失效，最后检查于 {}（播放 {} / 点赞 {} / 评论 {}）",
        record.description, checked, record.view_count, record.like_count, record.comment_count
    );

    let mut tags = Vec::with_capacity(record.tags.len() + 1);
    tags.push(REPUBLISH_TAG.to_string());
    tags.extend(record.tags.iter().cloned());

    PublishRequest {
        video_path,
        title: format!("{}{}", REPUBLISH_TITLE_PREFIX, record.title),
        description,
        tags,
        category_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::VideoStatus;

    fn record() -> VideoRecord {
        VideoRecord {
            id: "BV1xx411c7mD".to_string(),
            title: "测试: 视频?".to_string(),
            status: VideoStatus::Vanished,
            description: "原简介".to_string(),
            tags: vec!["音乐".to_string()],
            view_count: 1234,
            like_count: 56,
            comment_count: 7,
            first_seen: 1_700_000_000,
            last_checked: 1_700_000_000,
        }
    }

    #[test]
    fn request_embeds_marker_and_metadata() {
        let request = build_publish_request(&record(), PathBuf::from("/tmp/a.mp4"), 21);

        assert!(request.title.starts_with(REPUBLISH_TITLE_PREFIX));
        assert!(request.title.ends_with("测试: 视频?"));
        assert_eq!(request.tags[0], REPUBLISH_TAG);
        assert_eq!(request.tags[1], "音乐");
        assert!(request.description.starts_with("原简介"));
        assert!(request.description.contains("播放 1234"));
        assert!(request.description.contains("点赞 56"));
        assert!(request.description.contains("评论 7"));
        assert!(request.description.contains("2023-11-14"));
        assert_eq!(request.category_id, 21);
    }

    #[test]
    fn locate_probes_extensions_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let rec = record();

        assert!(locate_media_file(dir.path(), &rec.title, &rec.id).is_none());

        // 标题里的非法字符按下载规则替换后命中
        let flv = dir.path().join("测试_ 视频_ [BV1xx411c7mD].flv");
        std::fs::write(&flv, b"x").unwrap();
        assert_eq!(
            locate_media_file(dir.path(), &rec.title, &rec.id),
            Some(flv.clone())
        );

        // mp4 排在 flv 之前
        let mp4 = dir.path().join("测试_ 视频_ [BV1xx411c7mD].mp4");
        std::fs::write(&mp4, b"x").unwrap();
        assert_eq!(
            locate_media_file(dir.path(), &rec.title, &rec.id),
            Some(mp4)
        );
    }
}
