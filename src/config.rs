//! 应用配置模块

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// 应用配置，显式传入各组件，不使用全局可变状态
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// 要监控的 UP 主空间地址
    pub space_url: String,
    /// 下载目录
    pub download_dir: String,
    /// 每轮只检测空间最新的 N 个视频
    pub max_recent: usize,
    /// 补档成功后的冷却时间（秒）
    pub cooldown_secs: u64,
    /// 补档投稿分区 id
    pub category_id: u32,
    /// 下载器可执行文件
    pub ytdlp_program: String,
    /// 投稿器可执行文件
    pub biliup_program: String,
}

fn default_space_url() -> String {
    "https://space.bilibili.com/316568752/video".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            space_url: default_space_url(),
            download_dir: "./downloads".to_string(),
            max_recent: 3,
            cooldown_secs: 30,
            category_id: 21,
            ytdlp_program: "yt-dlp".to_string(),
            biliup_program: "biliup".to_string(),
        }
    }
}

impl AppConfig {
    /// 从配置文件加载，字段缺失取默认值
    pub fn load(config_dir: &Path) -> Self {
        let config_file = config_dir.join("config.json");
        if config_file.exists() {
            if let Ok(content) = fs::read_to_string(&config_file) {
                if let Ok(config) = serde_json::from_str::<AppConfig>(&content) {
                    return config;
                }
            }
        }
        Self::default()
    }

    /// 保存配置，保留文件里其他模块的配置段（如 log）
    pub fn save(&self, config_dir: &Path) -> io::Result<()> {
        let config_file = config_dir.join("config.json");

        // 读取现有配置
        let mut config: serde_json::Value = if config_file.exists() {
            let content = fs::read_to_string(&config_file)?;
            serde_json::from_str(&content).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        // 覆盖本模块的字段
        if let serde_json::Value::Object(fields) =
            serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
        {
            for (key, value) in fields {
                config[key] = value;
            }
        }

        fs::write(&config_file, serde_json::to_string_pretty(&config).unwrap())
    }
}
