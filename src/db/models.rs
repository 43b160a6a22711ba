use anyhow::Result;
use serde::{Deserialize, Serialize};

/// 视频状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    /// 在空间列表中正常可见
    Online,
    /// 曾经在线，最近一次快照中消失
    Vanished,
    /// 已补档重新投稿
    Republished,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Online => "online",
            VideoStatus::Vanished => "vanished",
            VideoStatus::Republished => "republished",
        }
    }

    /// 解析数据库中的状态字符串，未知值视为数据损坏
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "online" => Ok(VideoStatus::Online),
            "vanished" => Ok(VideoStatus::Vanished),
            "republished" => Ok(VideoStatus::Republished),
            _ => Err(anyhow::anyhow!("Invalid video status: {}", s)),
        }
    }
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 视频记录 - 每个追踪的视频一条，id 为 BV 号
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub status: VideoStatus,
    pub description: String,
    pub tags: Vec<String>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    /// 首次收录时间（Unix 秒）
    pub first_seen: i64,
    /// 最近一次检查时间（Unix 秒）
    pub last_checked: i64,
}

/// 指标刷新的部分更新，只覆盖计数器和检查时间
#[derive(Debug, Clone)]
pub struct StatUpdate {
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub checked_at: i64,
}

// 数据库表模型
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VideoRecordRow {
    pub id: String,
    pub title: String,
    pub status: String,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub first_seen: i64,
    pub last_checked: Option<i64>,
}

impl TryFrom<VideoRecordRow> for VideoRecord {
    type Error = anyhow::Error;

    fn try_from(row: VideoRecordRow) -> Result<Self, Self::Error> {
        let status = VideoStatus::parse(&row.status)?;

        // 旧行可能没有标签列，损坏的 JSON 按空处理
        let tags: Vec<String> = row
            .tags
            .as_deref()
            .map(|s| serde_json::from_str(s).unwrap_or_default())
            .unwrap_or_default();

        Ok(VideoRecord {
            id: row.id,
            title: row.title,
            status,
            description: row.description.unwrap_or_default(),
            tags,
            view_count: row.view_count.unwrap_or(0).max(0) as u64,
            like_count: row.like_count.unwrap_or(0).max(0) as u64,
            comment_count: row.comment_count.unwrap_or(0).max(0) as u64,
            first_seen: row.first_seen,
            last_checked: row.last_checked.unwrap_or(0),
        })
    }
}
