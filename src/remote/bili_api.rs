//! B 站 web 接口封装 - 单视频详情与统计

use super::{RemoteDetail, RemoteError, VideoDetail, DETAIL_TIMEOUT_SECS};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const API_BASE: &str = "https://api.bilibili.com";
/// -404 表示稿件不可见（删除、锁定或审核中）
const CODE_NOT_FOUND: i64 = -404;

#[derive(Debug, Deserialize)]
struct DetailResponse {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<DetailData>,
}

#[derive(Debug, Deserialize)]
struct DetailData {
    #[serde(rename = "View")]
    view: ViewData,
    #[serde(rename = "Tags", default)]
    tags: Vec<TagData>,
}

#[derive(Debug, Deserialize)]
struct ViewData {
    #[serde(default)]
    desc: String,
    stat: StatData,
}

#[derive(Debug, Deserialize)]
struct StatData {
    #[serde(default)]
    view: u64,
    #[serde(default)]
    like: u64,
    /// 评论数在接口里叫 reply
    #[serde(default)]
    reply: u64,
}

#[derive(Debug, Deserialize)]
struct TagData {
    tag_name: String,
}

pub struct BiliApiClient {
    http: reqwest::Client,
}

impl BiliApiClient {
    pub fn new() -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DETAIL_TIMEOUT_SECS))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64)")
            .build()
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl RemoteDetail for BiliApiClient {
    async fn video_detail(&self, id: &str) -> Result<VideoDetail, RemoteError> {
        let url = format!("{}/x/web-interface/view/detail?bvid={}", API_BASE, id);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        let body: DetailResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;

        if body.code == CODE_NOT_FOUND {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        if body.code != 0 {
            return Err(RemoteError::Unavailable(format!(
                "code={} {}",
                body.code, body.message
            )));
        }

        let data = body
            .data
            .ok_or_else(|| RemoteError::Parse("响应缺少 data 字段".to_string()))?;

        Ok(VideoDetail {
            view_count: data.view.stat.view,
            like_count: data.view.stat.like,
            comment_count: data.view.stat.reply,
            description: data.view.desc,
            tags: data.tags.into_iter().map(|t| t.tag_name).collect(),
        })
    }
}
