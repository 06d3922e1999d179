use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nt_core::types::newest_first;
use nt_core::{
    Article, ArticleQuery, ArticleStorage, Collection, Feed, Result, SummaryCacheEntry,
};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::StorageBackend;

/// The four collections, each behind its own lock so that writes to one
/// never wait on another.
#[derive(Default)]
pub struct MemoryStore {
    news: RwLock<HashMap<String, Article>>,
    feeds: RwLock<HashMap<String, Feed>>,
    summaries: RwLock<HashMap<String, SummaryCacheEntry>>,
    settings: RwLock<BTreeMap<String, Value>>,
}

/// Volatile backend, used for tests and one-shot runs.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<MemoryStore>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn upsert_articles(&self, articles: &[Article]) -> Result<()> {
        // The write guard is held for the whole batch.
        let mut news = self.store.news.write().await;
        for article in articles {
            news.insert(article.id.clone(), article.clone());
        }
        Ok(())
    }

    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        Ok(self.store.news.read().await.get(id).cloned())
    }

    async fn query_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>> {
        let news = self.store.news.read().await;
        let mut articles: Vec<Article> = news
            .values()
            .filter(|article| query.matches(article))
            .cloned()
            .collect();
        drop(news);

        articles.sort_by(newest_first);
        if let Some(limit) = query.limit {
            articles.truncate(limit);
        }
        Ok(articles)
    }

    async fn evict_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut news = self.store.news.write().await;
        let before = news.len();
        news.retain(|_, article| article.published_at >= cutoff);
        Ok(before - news.len())
    }

    async fn upsert_feeds(&self, feeds: &[Feed]) -> Result<()> {
        let mut stored = self.store.feeds.write().await;
        for feed in feeds {
            stored.insert(feed.url.clone(), feed.clone());
        }
        Ok(())
    }

    async fn get_feed(&self, url: &str) -> Result<Option<Feed>> {
        Ok(self.store.feeds.read().await.get(url).cloned())
    }

    async fn list_feeds(&self) -> Result<Vec<Feed>> {
        let mut feeds: Vec<Feed> = self.store.feeds.read().await.values().cloned().collect();
        feeds.sort_by(|a, b| a.added_at.cmp(&b.added_at).then_with(|| a.url.cmp(&b.url)));
        Ok(feeds)
    }

    async fn delete_feed(&self, url: &str) -> Result<()> {
        self.store.feeds.write().await.remove(url);
        Ok(())
    }

    async fn get_summary(&self, id: &str) -> Result<Option<SummaryCacheEntry>> {
        Ok(self.store.summaries.read().await.get(id).cloned())
    }

    async fn put_summary(&self, entry: &SummaryCacheEntry) -> Result<()> {
        self.store
            .summaries
            .write()
            .await
            .insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn summaries_by_topic(&self, topic: &str) -> Result<Vec<SummaryCacheEntry>> {
        let mut entries: Vec<SummaryCacheEntry> = self
            .store
            .summaries
            .read()
            .await
            .values()
            .filter(|entry| entry.topic == topic)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entries)
    }

    async fn get_setting(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.store.settings.read().await.get(key).cloned())
    }

    async fn put_setting(&self, key: &str, value: &Value) -> Result<()> {
        self.store
            .settings
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn all_settings(&self) -> Result<BTreeMap<String, Value>> {
        Ok(self.store.settings.read().await.clone())
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        Ok(match collection {
            Collection::News => self.store.news.read().await.len(),
            Collection::Feeds => self.store.feeds.read().await.len(),
            Collection::Summaries => self.store.summaries.read().await.len(),
            Collection::Settings => self.store.settings.read().await.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn article(id: &str, topic: &str, feed_url: &str, age_days: i64) -> Article {
        let now = Utc::now();
        Article {
            id: id.to_string(),
            title: format!("Article {}", id),
            link: Some(format!("https://example.com/{}", id)),
            description: String::new(),
            content: String::new(),
            published_at: now - Duration::days(age_days),
            author: "Test Author".to_string(),
            categories: vec![],
            image: None,
            feed_url: feed_url.to_string(),
            feed_title: "Example".to_string(),
            fetched_at: now,
            topic: Some(topic.to_string()),
            summary: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_per_id() {
        let storage = MemoryStorage::new();
        let mut first = article("a", "ai", "https://feed", 0);
        storage.upsert_articles(&[first.clone()]).await.unwrap();

        first.summary = Some("updated".to_string());
        storage.upsert_articles(&[first.clone(), first.clone()]).await.unwrap();

        assert_eq!(storage.count(Collection::News).await.unwrap(), 1);
        let stored = storage.get_article("a").await.unwrap().unwrap();
        assert_eq!(stored.summary.as_deref(), Some("updated"));
    }

    #[tokio::test]
    async fn test_query_filters_before_limit() {
        let storage = MemoryStorage::new();
        storage
            .upsert_articles(&[
                article("a", "ai", "https://one", 1),
                article("b", "science", "https://one", 0),
                article("c", "ai", "https://two", 2),
                article("d", "ai", "https://one", 3),
            ])
            .await
            .unwrap();

        let ai = storage
            .query_articles(&ArticleQuery::default().topic("ai").limit(2))
            .await
            .unwrap();
        let ids: Vec<&str> = ai.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);

        let one = storage
            .query_articles(&ArticleQuery::default().feed_url("https://one"))
            .await
            .unwrap();
        let ids: Vec<&str> = one.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "d"]);

        let all = storage.query_articles(&ArticleQuery::default()).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_evict_stale_uses_published_date() {
        let storage = MemoryStorage::new();
        storage
            .upsert_articles(&[
                article("old", "ai", "https://one", 8),
                article("recent", "ai", "https://one", 6),
            ])
            .await
            .unwrap();

        let deleted = storage.evict_stale(7).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(storage.get_article("old").await.unwrap().is_none());
        assert!(storage.get_article("recent").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_feed_keeps_articles() {
        let storage = MemoryStorage::new();
        storage
            .upsert_feeds(&[Feed::new("https://one", "One")])
            .await
            .unwrap();
        storage
            .upsert_articles(&[article("a", "ai", "https://one", 0)])
            .await
            .unwrap();

        storage.delete_feed("https://one").await.unwrap();
        assert!(storage.get_feed("https://one").await.unwrap().is_none());
        assert_eq!(storage.count(Collection::News).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_settings_overwrite() {
        let storage = MemoryStorage::new();
        storage
            .put_setting("refresh_interval", &Value::from(30))
            .await
            .unwrap();
        storage
            .put_setting("refresh_interval", &Value::from(45))
            .await
            .unwrap();

        assert_eq!(
            storage.get_setting("refresh_interval").await.unwrap(),
            Some(Value::from(45))
        );
        assert_eq!(storage.all_settings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stats_histogram() {
        let storage = MemoryStorage::new();
        storage
            .upsert_articles(&[
                article("a", "ai", "https://one", 0),
                article("b", "ai", "https://one", 0),
                article("c", "science", "https://one", 0),
            ])
            .await
            .unwrap();
        storage
            .upsert_feeds(&[Feed::new("https://one", "One")])
            .await
            .unwrap();

        let stats = storage.stats().await.unwrap();
        assert_eq!(stats.total_news, 3);
        assert_eq!(stats.total_feeds, 1);
        assert_eq!(stats.total_summaries, 0);
        assert_eq!(stats.topic_counts.get("ai"), Some(&2));
        assert_eq!(stats.topic_counts.get("science"), Some(&1));
    }
}
