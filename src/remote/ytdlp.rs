//! yt-dlp 外部命令封装 - 空间列表与批量下载

use super::{FetchedMedia, MediaFetcher, RemoteListing, RemoteVideo};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// 平铺播放列表的一条目
#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlatPlaylist {
    #[serde(default)]
    entries: Vec<FlatEntry>,
}

/// 下载完成后 --print-json 输出的信息行
#[derive(Debug, Deserialize)]
struct DownloadInfo {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    like_count: Option<u64>,
    #[serde(default)]
    comment_count: Option<u64>,
}

pub struct YtDlpClient {
    program: String,
    download_dir: PathBuf,
}

impl YtDlpClient {
    pub fn new(program: &str, download_dir: &Path) -> Self {
        Self {
            program: program.to_string(),
            download_dir: download_dir.to_path_buf(),
        }
    }
}

#[async_trait]
impl RemoteListing for YtDlpClient {
    async fn list_recent(&self, space_url: &str, max_count: usize) -> Result<Vec<RemoteVideo>> {
        let output = Command::new(&self.program)
            .arg("--flat-playlist")
            .arg("-J")
            .arg("--playlist-end")
            .arg(max_count.to_string())
            .arg(space_url)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("无法执行 {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "获取空间列表失败 ({}): {}",
                output.status,
                stderr.lines().last().unwrap_or_default()
            );
        }

        let playlist: FlatPlaylist =
            serde_json::from_slice(&output.stdout).context("解析空间列表 JSON 失败")?;

        let videos = playlist
            .entries
            .into_iter()
            .filter_map(|e| {
                let id = e.id?;
                Some(RemoteVideo {
                    title: e.title.unwrap_or_else(|| id.clone()),
                    id,
                })
            })
            .collect();

        Ok(videos)
    }
}

#[async_trait]
impl MediaFetcher for YtDlpClient {
    /// 一次进程调用下载整批 URL，逐行读取 --print-json 输出，
    /// 每完成一个视频发送一条事件
    async fn fetch_batch(
        &self,
        urls: &[String],
        events: mpsc::UnboundedSender<FetchedMedia>,
    ) -> Result<()> {
        let out_template = self.download_dir.join("%(title)s [%(id)s].%(ext)s");

        let mut child = Command::new(&self.program)
            .arg("-o")
            .arg(&out_template)
            .arg("--merge-output-format")
            .arg("mp4")
            .arg("--print-json")
            .args(urls)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("无法执行 {}", self.program))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("无法读取下载进程输出"))?;

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            let info: DownloadInfo = match serde_json::from_str(&line) {
                Ok(info) => info,
                Err(e) => {
                    tracing::debug!("跳过无法解析的输出行: {}", e);
                    continue;
                }
            };

            let media = FetchedMedia {
                id: info.id,
                title: info.title,
                description: info.description,
                tags: info.tags,
                view_count: info.view_count.unwrap_or(0),
                like_count: info.like_count.unwrap_or(0),
                comment_count: info.comment_count.unwrap_or(0),
            };

            // 接收端先于进程结束关闭时，剩余事件只能丢弃
            if events.send(media).is_err() {
                break;
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            anyhow::bail!("下载进程退出异常: {}", status);
        }

        Ok(())
    }
}
