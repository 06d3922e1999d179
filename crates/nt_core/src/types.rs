use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Topic assigned when no keyword of the topic table matches.
pub const OTHER_TOPIC: &str = "other";

/// Pseudo topic used by the presentation layer for "no filter".
pub const ALL_TOPICS: &str = "all";

/// A normalized feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub link: Option<String>,
    pub description: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub author: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub image: Option<String>,
    pub feed_url: String,
    pub feed_title: String,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl Article {
    pub fn topic_or_other(&self) -> &str {
        self.topic.as_deref().unwrap_or(OTHER_TOPIC)
    }
}

/// A subscribed feed, keyed by its URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub url: String,
    pub name: String,
    pub added_at: DateTime<Utc>,
    pub last_fetch: Option<DateTime<Utc>>,
}

impl Feed {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            url: url.into(),
            name: name.into(),
            added_at: now,
            last_fetch: Some(now),
        }
    }
}

/// A generated topic digest, valid for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryCacheEntry {
    pub id: String,
    pub topic: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
}

/// Filters for [`crate::ArticleStorage::query_articles`]. Filters apply
/// before the limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleQuery {
    pub topic: Option<String>,
    pub feed_url: Option<String>,
    pub limit: Option<usize>,
}

impl ArticleQuery {
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn feed_url(mut self, feed_url: impl Into<String>) -> Self {
        self.feed_url = Some(feed_url.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, article: &Article) -> bool {
        if let Some(topic) = &self.topic {
            if article.topic.as_deref() != Some(topic.as_str()) {
                return false;
            }
        }
        if let Some(feed_url) = &self.feed_url {
            if &article.feed_url != feed_url {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    News,
    Feeds,
    Summaries,
    Settings,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::News => "news",
            Collection::Feeds => "feeds",
            Collection::Summaries => "summaries",
            Collection::Settings => "settings",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_news: usize,
    pub total_feeds: usize,
    pub total_summaries: usize,
    pub topic_counts: BTreeMap<String, usize>,
}

/// Orders articles newest first; equal timestamps fall back to the id so the
/// order is stable across backends.
pub fn newest_first(a: &Article, b: &Article) -> std::cmp::Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Prefix of `text` holding at most `max` characters.
pub fn clip(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_counts_chars() {
        assert_eq!(clip("привет", 3), "при");
        assert_eq!(clip("abc", 10), "abc");
        assert_eq!(clip("", 5), "");
    }
}
