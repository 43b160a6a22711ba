//! 视频记录存储 - 每条记录即永久档案，只更新不删除

pub mod models;
pub use models::*;

use anyhow::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;

/// 视频记录管理器
#[derive(Clone)]
pub struct VideoStore {
    db: Arc<SqlitePool>,
}

impl VideoStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// 获取所有已知视频的 id -> 状态映射（快照比较的输入）
    pub async fn get_all_statuses(&self) -> Result<HashMap<String, VideoStatus>> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT id, status FROM videos")
            .fetch_all(&*self.db)
            .await?;

        let mut map = HashMap::new();
        for (id, status) in rows {
            map.insert(id, VideoStatus::parse(&status)?);
        }

        Ok(map)
    }

    /// 获取单条视频记录
    pub async fn get(&self, id: &str) -> Result<Option<VideoRecord>> {
        let row = sqlx::query_as::<_, VideoRecordRow>("SELECT * FROM videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.db)
            .await?;

        match row {
            Some(r) => Ok(Some(r.try_into()?)),
            None => Ok(None),
        }
    }

    /// 插入或整条覆盖记录。first_seen 在记录创建后不再改变，
    /// last_checked 只增不减
    pub async fn upsert(&self, record: &VideoRecord) -> Result<()> {
        let tags = serde_json::to_string(&record.tags)?;

        sqlx::query(
            r#"
            INSERT INTO videos (id, title, status, description, tags, view_count, like_count, comment_count, first_seen, last_checked)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                status = excluded.status,
                description = excluded.description,
                tags = excluded.tags,
                view_count = excluded.view_count,
                like_count = excluded.like_count,
                comment_count = excluded.comment_count,
                last_checked = MAX(videos.last_checked, excluded.last_checked)
            "#,
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(record.status.as_str())
        .bind(&record.description)
        .bind(&tags)
        .bind(record.view_count as i64)
        .bind(record.like_count as i64)
        .bind(record.comment_count as i64)
        .bind(record.first_seen)
        .bind(record.last_checked)
        .execute(&*self.db)
        .await?;

        Ok(())
    }

    /// 只更新计数器和检查时间，其余字段不动
    pub async fn update_stats(&self, id: &str, update: &StatUpdate) -> Result<()> {
        sqlx::query(
            r#"UPDATE videos
               SET view_count = ?, like_count = ?, comment_count = ?,
                   last_checked = MAX(last_checked, ?)
               WHERE id = ?"#,
        )
        .bind(update.view_count as i64)
        .bind(update.like_count as i64)
        .bind(update.comment_count as i64)
        .bind(update.checked_at)
        .bind(id)
        .execute(&*self.db)
        .await?;

        Ok(())
    }

    /// 状态迁移的唯一写入口，只允许引擎各阶段调用
    pub async fn update_status(&self, id: &str, status: VideoStatus) -> Result<()> {
        sqlx::query("UPDATE videos SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&*self.db)
            .await?;

        Ok(())
    }

    /// 按状态列出记录，顺序稳定（收录时间 + id）
    pub async fn list_by_status(&self, status: VideoStatus) -> Result<Vec<VideoRecord>> {
        let rows = sqlx::query_as::<_, VideoRecordRow>(
            "SELECT * FROM videos WHERE status = ? ORDER BY first_seen, id",
        )
        .bind(status.as_str())
        .fetch_all(&*self.db)
        .await?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.try_into()?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> VideoStore {
        // 内存库只能用单连接，多连接会各开一个空库
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        VideoStore::new(Arc::new(pool))
    }

    fn sample_record(id: &str) -> VideoRecord {
        VideoRecord {
            id: id.to_string(),
            title: format!("测试视频 {}", id),
            status: VideoStatus::Online,
            description: "简介".to_string(),
            tags: vec!["音乐".to_string(), "翻唱".to_string()],
            view_count: 100,
            like_count: 10,
            comment_count: 5,
            first_seen: 1_700_000_000,
            last_checked: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let store = test_store().await;
        let record = sample_record("BV1xx411c7mD");

        store.upsert(&record).await.unwrap();
        store.upsert(&record).await.unwrap();

        let loaded = store.get("BV1xx411c7mD").await.unwrap().unwrap();
        assert_eq!(loaded.title, record.title);
        assert_eq!(loaded.tags, record.tags);
        assert_eq!(loaded.view_count, 100);
        assert_eq!(loaded.first_seen, record.first_seen);

        let all = store.get_all_statuses().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn update_stats_leaves_other_fields_untouched() {
        let store = test_store().await;
        let record = sample_record("BV1xx411c7mD");
        store.upsert(&record).await.unwrap();

        store
            .update_stats(
                "BV1xx411c7mD",
                &StatUpdate {
                    view_count: 500,
                    like_count: 50,
                    comment_count: 20,
                    checked_at: 1_700_001_000,
                },
            )
            .await
            .unwrap();

        let loaded = store.get("BV1xx411c7mD").await.unwrap().unwrap();
        assert_eq!(loaded.view_count, 500);
        assert_eq!(loaded.like_count, 50);
        assert_eq!(loaded.comment_count, 20);
        assert_eq!(loaded.last_checked, 1_700_001_000);
        // 其余字段保持原样
        assert_eq!(loaded.title, record.title);
        assert_eq!(loaded.description, record.description);
        assert_eq!(loaded.status, VideoStatus::Online);
        assert_eq!(loaded.first_seen, record.first_seen);
    }

    #[tokio::test]
    async fn last_checked_never_decreases() {
        let store = test_store().await;
        let record = sample_record("BV1xx411c7mD");
        store.upsert(&record).await.unwrap();

        store
            .update_stats(
                "BV1xx411c7mD",
                &StatUpdate {
                    view_count: 1,
                    like_count: 1,
                    comment_count: 1,
                    checked_at: 1_600_000_000,
                },
            )
            .await
            .unwrap();

        let loaded = store.get("BV1xx411c7mD").await.unwrap().unwrap();
        assert_eq!(loaded.last_checked, 1_700_000_000);
    }

    #[tokio::test]
    async fn unknown_status_is_rejected_on_load() {
        let store = test_store().await;
        sqlx::query("INSERT INTO videos (id, title, status, first_seen) VALUES (?, ?, ?, ?)")
            .bind("BV1bad")
            .bind("坏数据")
            .bind("archived")
            .bind(0i64)
            .execute(&*store.db)
            .await
            .unwrap();

        assert!(store.get_all_statuses().await.is_err());
        assert!(store.get("BV1bad").await.is_err());
    }

    #[tokio::test]
    async fn legacy_rows_default_missing_fields() {
        let store = test_store().await;
        // 迁移前的老数据只有 id/title/first_seen，其余列靠默认值
        sqlx::query("INSERT INTO videos (id, title, first_seen) VALUES (?, ?, ?)")
            .bind("BV1old")
            .bind("老视频")
            .bind(1_600_000_000i64)
            .execute(&*store.db)
            .await
            .unwrap();

        let loaded = store.get("BV1old").await.unwrap().unwrap();
        assert_eq!(loaded.status, VideoStatus::Online);
        assert_eq!(loaded.description, "");
        assert!(loaded.tags.is_empty());
        assert_eq!(loaded.view_count, 0);
        assert_eq!(loaded.last_checked, 0);
    }

    #[tokio::test]
    async fn list_by_status_is_stable_and_filtered() {
        let store = test_store().await;
        let mut a = sample_record("BV1a");
        a.first_seen = 100;
        let mut b = sample_record("BV1b");
        b.first_seen = 50;
        let mut c = sample_record("BV1c");
        c.first_seen = 100;
        store.upsert(&a).await.unwrap();
        store.upsert(&b).await.unwrap();
        store.upsert(&c).await.unwrap();
        store
            .update_status("BV1a", VideoStatus::Vanished)
            .await
            .unwrap();
        store
            .update_status("BV1c", VideoStatus::Vanished)
            .await
            .unwrap();

        let vanished = store.list_by_status(VideoStatus::Vanished).await.unwrap();
        let ids: Vec<_> = vanished.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["BV1a", "BV1c"]);

        let online = store.list_by_status(VideoStatus::Online).await.unwrap();
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].id, "BV1b");
    }
}
