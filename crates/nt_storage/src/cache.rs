//! Per-day cache of generated topic digests.
//!
//! Entries are keyed by topic and local calendar day, so a digest produced
//! today is never served tomorrow. Old entries are not pruned.

use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use nt_core::{ArticleStorage, Result, SummaryCacheEntry};

pub fn cache_key(topic: &str, day: NaiveDate) -> String {
    format!("topic_{}_{}", topic, day.format("%Y-%m-%d"))
}

#[derive(Clone)]
pub struct SummaryCache {
    storage: Arc<dyn ArticleStorage>,
}

impl SummaryCache {
    pub fn new(storage: Arc<dyn ArticleStorage>) -> Self {
        Self { storage }
    }

    pub async fn get(&self, topic: &str, day: NaiveDate) -> Result<Option<SummaryCacheEntry>> {
        self.storage.get_summary(&cache_key(topic, day)).await
    }

    pub async fn get_today(&self, topic: &str) -> Result<Option<SummaryCacheEntry>> {
        self.get(topic, Local::now().date_naive()).await
    }

    pub async fn put(&self, topic: &str, day: NaiveDate, content: &str) -> Result<SummaryCacheEntry> {
        let entry = SummaryCacheEntry {
            id: cache_key(topic, day),
            topic: topic.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.storage.put_summary(&entry).await?;
        tracing::debug!("Cached digest {}", entry.id);
        Ok(entry)
    }

    pub async fn put_today(&self, topic: &str, content: &str) -> Result<SummaryCacheEntry> {
        self.put(topic, Local::now().date_naive(), content).await
    }
}
