use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nt_core::{
    Article, ArticleQuery, ArticleStorage, Collection, Error, Feed, Result, SummaryCacheEntry,
};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS news (
        id TEXT PRIMARY KEY,
        topic TEXT,
        feed_url TEXT NOT NULL,
        published_at INTEGER NOT NULL,
        data TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS news_date ON news (published_at)",
    "CREATE INDEX IF NOT EXISTS news_topic ON news (topic)",
    "CREATE INDEX IF NOT EXISTS news_feed_url ON news (feed_url)",
    r#"
    CREATE TABLE IF NOT EXISTS feeds (
        url TEXT PRIMARY KEY,
        added_at INTEGER NOT NULL,
        data TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS summaries (
        id TEXT PRIMARY KEY,
        topic TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        data TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS summaries_topic ON summaries (topic)",
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
];

fn db_err(context: &'static str) -> impl Fn(sqlx::Error) -> Error {
    move |e| Error::Storage(format!("{}: {}", context, e))
}

/// Durable backend on a single SQLite file. Each batch write runs in one
/// transaction.
pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl StorageBackend for SQLiteStorage {
    fn name(&self) -> &'static str {
        "sqlite"
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Storage(format!("failed to create database directory: {}", e))
                })?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .map_err(db_err("invalid database path"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_err("failed to connect to database"))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn decode<T: serde::de::DeserializeOwned>(data: &str) -> Result<T> {
    Ok(serde_json::from_str(data)?)
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn upsert_articles(&self, articles: &[Article]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err("failed to begin"))?;
        for article in articles {
            let data = serde_json::to_string(article)?;
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO news (id, topic, feed_url, published_at, data)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&article.id)
            .bind(article.topic.as_deref())
            .bind(&article.feed_url)
            .bind(article.published_at.timestamp_millis())
            .bind(data)
            .execute(&mut *tx)
            .await
            .map_err(db_err("failed to store article"))?;
        }
        tx.commit().await.map_err(db_err("failed to commit articles"))?;
        Ok(())
    }

    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT data FROM news WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("failed to get article"))?;
        row.map(|row| decode(row.get::<String, _>("data").as_str()))
            .transpose()
    }

    async fn query_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT data FROM news");
        let mut separator = " WHERE ";
        if let Some(topic) = &query.topic {
            builder.push(separator).push("topic = ").push_bind(topic.clone());
            separator = " AND ";
        }
        if let Some(feed_url) = &query.feed_url {
            builder.push(separator).push("feed_url = ").push_bind(feed_url.clone());
        }
        builder.push(" ORDER BY published_at DESC, id ASC");
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("failed to query articles"))?;

        rows.iter()
            .map(|row| decode(row.get::<String, _>("data").as_str()))
            .collect()
    }

    async fn evict_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let rows = sqlx::query("SELECT id, data FROM news")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("failed to scan articles"))?;

        let mut stale = Vec::new();
        for row in &rows {
            let article: Article = decode(row.get::<String, _>("data").as_str())?;
            if article.published_at < cutoff {
                stale.push(row.get::<String, _>("id"));
            }
        }

        if stale.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(db_err("failed to begin"))?;
        for id in &stale {
            sqlx::query("DELETE FROM news WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_err("failed to delete article"))?;
        }
        tx.commit().await.map_err(db_err("failed to commit eviction"))?;
        Ok(stale.len())
    }

    async fn upsert_feeds(&self, feeds: &[Feed]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err("failed to begin"))?;
        for feed in feeds {
            sqlx::query("INSERT OR REPLACE INTO feeds (url, added_at, data) VALUES (?, ?, ?)")
                .bind(&feed.url)
                .bind(feed.added_at.timestamp_millis())
                .bind(serde_json::to_string(feed)?)
                .execute(&mut *tx)
                .await
                .map_err(db_err("failed to store feed"))?;
        }
        tx.commit().await.map_err(db_err("failed to commit feeds"))?;
        Ok(())
    }

    async fn get_feed(&self, url: &str) -> Result<Option<Feed>> {
        let row = sqlx::query("SELECT data FROM feeds WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("failed to get feed"))?;
        row.map(|row| decode(row.get::<String, _>("data").as_str()))
            .transpose()
    }

    async fn list_feeds(&self) -> Result<Vec<Feed>> {
        let rows = sqlx::query("SELECT data FROM feeds ORDER BY added_at ASC, url ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("failed to list feeds"))?;
        rows.iter()
            .map(|row| decode(row.get::<String, _>("data").as_str()))
            .collect()
    }

    async fn delete_feed(&self, url: &str) -> Result<()> {
        sqlx::query("DELETE FROM feeds WHERE url = ?")
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(db_err("failed to delete feed"))?;
        Ok(())
    }

    async fn get_summary(&self, id: &str) -> Result<Option<SummaryCacheEntry>> {
        let row = sqlx::query("SELECT data FROM summaries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("failed to get summary"))?;
        row.map(|row| decode(row.get::<String, _>("data").as_str()))
            .transpose()
    }

    async fn put_summary(&self, entry: &SummaryCacheEntry) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO summaries (id, topic, created_at, data) VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.topic)
        .bind(entry.created_at.timestamp_millis())
        .bind(serde_json::to_string(entry)?)
        .execute(&self.pool)
        .await
        .map_err(db_err("failed to store summary"))?;
        Ok(())
    }

    async fn summaries_by_topic(&self, topic: &str) -> Result<Vec<SummaryCacheEntry>> {
        let rows = sqlx::query("SELECT data FROM summaries WHERE topic = ? ORDER BY created_at ASC")
            .bind(topic)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("failed to list summaries"))?;
        rows.iter()
            .map(|row| decode(row.get::<String, _>("data").as_str()))
            .collect()
    }

    async fn get_setting(&self, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("failed to get setting"))?;
        row.map(|row| decode(row.get::<String, _>("value").as_str()))
            .transpose()
    }

    async fn put_setting(&self, key: &str, value: &Value) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(serde_json::to_string(value)?)
            .execute(&self.pool)
            .await
            .map_err(db_err("failed to store setting"))?;
        Ok(())
    }

    async fn all_settings(&self) -> Result<BTreeMap<String, Value>> {
        let rows = sqlx::query("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("failed to list settings"))?;
        let mut settings = BTreeMap::new();
        for row in &rows {
            let value: Value = decode(row.get::<String, _>("value").as_str())?;
            settings.insert(row.get::<String, _>("key"), value);
        }
        Ok(settings)
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", collection.name());
        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("failed to count records"))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn article(id: &str, topic: &str, age_days: i64) -> Article {
        let now = Utc::now();
        Article {
            id: id.to_string(),
            title: format!("Article {}", id),
            link: None,
            description: "description".to_string(),
            content: "content".to_string(),
            published_at: now - Duration::days(age_days),
            author: "Test Author".to_string(),
            categories: vec!["rust".to_string()],
            image: None,
            feed_url: "https://example.com/feed".to_string(),
            feed_title: "Example".to_string(),
            fetched_at: now,
            topic: Some(topic.to_string()),
            summary: None,
        }
    }

    #[tokio::test]
    async fn test_sqlite_storage() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();

        storage
            .upsert_articles(&[article("a", "ai", 0), article("b", "science", 1)])
            .await
            .unwrap();

        let stored = storage.get_article("a").await.unwrap().unwrap();
        assert_eq!(stored.categories, vec!["rust".to_string()]);

        let ai = storage
            .query_articles(&ArticleQuery::default().topic("ai"))
            .await
            .unwrap();
        assert_eq!(ai.len(), 1);
        assert_eq!(ai[0].id, "a");

        let limited = storage
            .query_articles(&ArticleQuery::default().limit(1))
            .await
            .unwrap();
        assert_eq!(limited[0].id, "a");
    }

    #[tokio::test]
    async fn test_sqlite_eviction_and_reopen() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("news.db");

        {
            let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
            storage
                .upsert_articles(&[article("old", "ai", 8), article("recent", "ai", 6)])
                .await
                .unwrap();
            assert_eq!(storage.evict_stale(7).await.unwrap(), 1);
            storage
                .upsert_feeds(&[Feed::new("https://example.com/feed", "Example")])
                .await
                .unwrap();
            storage
                .put_setting("auto_summarize", &Value::Bool(false))
                .await
                .unwrap();
            storage.close().await;
        }

        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        assert!(storage.get_article("old").await.unwrap().is_none());
        assert!(storage.get_article("recent").await.unwrap().is_some());
        assert_eq!(storage.list_feeds().await.unwrap().len(), 1);
        assert_eq!(
            storage.get_setting("auto_summarize").await.unwrap(),
            Some(Value::Bool(false))
        );
    }

    #[tokio::test]
    async fn test_sqlite_summaries() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("s.db"))
            .await
            .unwrap();

        let entry = SummaryCacheEntry {
            id: "topic_ai_2024-05-01".to_string(),
            topic: "ai".to_string(),
            content: "digest".to_string(),
            created_at: Utc::now(),
        };
        storage.put_summary(&entry).await.unwrap();

        assert_eq!(storage.get_summary(&entry.id).await.unwrap(), Some(entry.clone()));
        assert_eq!(storage.summaries_by_topic("ai").await.unwrap().len(), 1);
        assert_eq!(storage.count(Collection::Summaries).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_no_partial_writes() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("tx.db"))
            .await
            .unwrap();
        storage.upsert_articles(&[article("kept", "ai", 0)]).await.unwrap();

        sqlx::query(
            "CREATE TRIGGER reject_bad BEFORE INSERT ON news WHEN NEW.id = 'bad' \
             BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(&storage.pool)
        .await
        .unwrap();

        let mut updated = article("kept", "science", 0);
        updated.summary = Some("changed".to_string());
        let result = storage
            .upsert_articles(&[article("good", "ai", 0), updated, article("bad", "ai", 0)])
            .await;

        assert!(matches!(result, Err(Error::Storage(_))));
        assert!(storage.get_article("good").await.unwrap().is_none());
        let kept = storage.get_article("kept").await.unwrap().unwrap();
        assert_eq!(kept.topic.as_deref(), Some("ai"));
        assert_eq!(kept.summary, None);
        assert_eq!(storage.count(Collection::News).await.unwrap(), 1);
    }
}
