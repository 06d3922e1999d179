use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::types::{Article, ArticleQuery, Collection, Feed, Stats, SummaryCacheEntry};
use crate::Result;

/// Keyed persistence for articles, feeds, cached summaries and settings.
///
/// Every batch write is all-or-nothing: readers observe either the state
/// before the batch or the state after it.
#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Insert or overwrite articles by id. Later items win over earlier ones
    /// with the same id.
    async fn upsert_articles(&self, articles: &[Article]) -> Result<()>;

    async fn get_article(&self, id: &str) -> Result<Option<Article>>;

    /// Articles newest first, filtered then limited.
    async fn query_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>>;

    /// Delete every article published before `cutoff`. Visits all records.
    async fn evict_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    async fn upsert_feeds(&self, feeds: &[Feed]) -> Result<()>;

    async fn get_feed(&self, url: &str) -> Result<Option<Feed>>;

    /// All feeds ordered by subscription time.
    async fn list_feeds(&self) -> Result<Vec<Feed>>;

    /// Removes the feed record only, its articles stay.
    async fn delete_feed(&self, url: &str) -> Result<()>;

    async fn get_summary(&self, id: &str) -> Result<Option<SummaryCacheEntry>>;

    async fn put_summary(&self, entry: &SummaryCacheEntry) -> Result<()>;

    async fn summaries_by_topic(&self, topic: &str) -> Result<Vec<SummaryCacheEntry>>;

    async fn get_setting(&self, key: &str) -> Result<Option<Value>>;

    async fn put_setting(&self, key: &str, value: &Value) -> Result<()>;

    async fn all_settings(&self) -> Result<BTreeMap<String, Value>>;

    async fn count(&self, collection: Collection) -> Result<usize>;

    /// Delete articles older than `max_age_days` days.
    async fn evict_stale(&self, max_age_days: i64) -> Result<usize> {
        self.evict_before(Utc::now() - Duration::days(max_age_days))
            .await
    }

    async fn stats(&self) -> Result<Stats> {
        let articles = self.query_articles(&ArticleQuery::default()).await?;
        let mut topic_counts = BTreeMap::new();
        for article in &articles {
            *topic_counts
                .entry(article.topic_or_other().to_string())
                .or_insert(0) += 1;
        }

        Ok(Stats {
            total_news: self.count(Collection::News).await?,
            total_feeds: self.count(Collection::Feeds).await?,
            total_summaries: self.count(Collection::Summaries).await?,
            topic_counts,
        })
    }
}
