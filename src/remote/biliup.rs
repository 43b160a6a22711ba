//! biliup 外部命令封装 - 补档投稿

use super::{PublishRequest, Publisher};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

pub struct BiliupUploader {
    program: String,
}

impl BiliupUploader {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

#[async_trait]
impl Publisher for BiliupUploader {
    async fn publish(&self, request: &PublishRequest) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("upload")
            .arg(&request.video_path)
            .arg("--title")
            .arg(&request.title)
            .arg("--desc")
            .arg(&request.description)
            .arg("--tid")
            .arg(request.category_id.to_string())
            .arg("--tag")
            .arg(request.tags.join(","))
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("无法执行 {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "投稿失败 ({}): {}",
                output.status,
                stderr.lines().last().unwrap_or_default()
            );
        }

        tracing::debug!("投稿命令执行成功: {}", request.video_path.display());
        Ok(())
    }
}
