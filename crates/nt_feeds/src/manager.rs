use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use nt_core::config::FeedsConfig;
use nt_core::types::newest_first;
use nt_core::{Article, ArticleQuery, ArticleStorage, Error, Feed, Result, Stats, ALL_TOPICS};
use tokio::sync::{RwLock, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::classifier::{trending_keywords, KeywordCount, TopicClassifier, TopicCount};
use crate::dedup::{deduplicate, find_similar, SimilarArticle};
use crate::fetcher::{validate_feed_url, FeedFetcher};
use crate::normalizer::parse_feed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RefreshState {
    Idle = 0,
    Refreshing = 1,
}

/// At most one refresh at a time; a second caller is turned away instead of
/// queued.
#[derive(Debug, Default)]
struct RefreshGate(AtomicU8);

impl RefreshGate {
    fn try_begin(&self) -> Option<RefreshGuard<'_>> {
        self.0
            .compare_exchange(
                RefreshState::Idle as u8,
                RefreshState::Refreshing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()
            .map(|_| RefreshGuard(&self.0))
    }

    fn state(&self) -> RefreshState {
        if self.0.load(Ordering::Acquire) == RefreshState::Refreshing as u8 {
            RefreshState::Refreshing
        } else {
            RefreshState::Idle
        }
    }
}

struct RefreshGuard<'a>(&'a AtomicU8);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(RefreshState::Idle as u8, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct FeedFailure {
    pub feed: Feed,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct RefreshReport {
    /// New articles of this refresh, classified and deduplicated.
    pub articles: Vec<Article>,
    pub errors: Vec<FeedFailure>,
    pub evicted: usize,
    pub working_set_len: usize,
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Completed(RefreshReport),
    Skipped,
}

/// Drives fetching, normalization, classification, deduplication and
/// persistence, and keeps the working set shown to the user.
pub struct FeedManager {
    storage: Arc<dyn ArticleStorage>,
    fetcher: Arc<dyn FeedFetcher>,
    classifier: TopicClassifier,
    config: FeedsConfig,
    semaphore: Arc<Semaphore>,
    gate: RefreshGate,
    working_set: RwLock<Vec<Article>>,
}

impl FeedManager {
    pub fn new(
        storage: Arc<dyn ArticleStorage>,
        fetcher: Arc<dyn FeedFetcher>,
        classifier: TopicClassifier,
        config: FeedsConfig,
    ) -> Self {
        let permits = config.max_concurrent_fetches.max(1);
        Self {
            storage,
            fetcher,
            classifier,
            config,
            semaphore: Arc::new(Semaphore::new(permits)),
            gate: RefreshGate::default(),
            working_set: RwLock::new(Vec::new()),
        }
    }

    pub fn storage(&self) -> &Arc<dyn ArticleStorage> {
        &self.storage
    }

    pub fn classifier(&self) -> &TopicClassifier {
        &self.classifier
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.gate.state()
    }

    /// Fill the working set with the newest stored articles.
    pub async fn load(&self) -> Result<usize> {
        let articles = self
            .storage
            .query_articles(&ArticleQuery::default().limit(self.config.page_size))
            .await?;
        let len = articles.len();
        *self.working_set.write().await = articles;
        debug!("Loaded {} stored articles", len);
        Ok(len)
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<Article>> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| Error::External(e.into()))?;

        let secs = self.config.fetch_timeout_secs;
        let payload = timeout(Duration::from_secs(secs), self.fetcher.fetch(url))
            .await
            .map_err(|_| Error::Fetch(format!("{} timed out after {}s", url, secs)))??;
        parse_feed(&payload, url)
    }

    /// Classify and deduplicate a fresh batch, persist it, then fold it into
    /// the working set.
    async fn ingest(&self, articles: Vec<Article>) -> Result<(Vec<Article>, usize)> {
        let mut articles = deduplicate(self.classifier.assign_topics(articles));
        if articles.is_empty() {
            return Ok((articles, self.working_set.read().await.len()));
        }
        self.carry_summaries(&mut articles).await?;
        self.storage.upsert_articles(&articles).await?;

        let mut working_set = self.working_set.write().await;
        let mut merged = articles.clone();
        merged.extend(working_set.drain(..));
        let mut merged = deduplicate(merged);
        merged.sort_by(newest_first);
        merged.truncate(self.config.page_size * 2);
        *working_set = merged;
        Ok((articles, working_set.len()))
    }

    /// Refetched entries arrive without a summary; keep the one already
    /// generated for the same id.
    async fn carry_summaries(&self, articles: &mut [Article]) -> Result<()> {
        let known: HashMap<String, String> = self
            .working_set
            .read()
            .await
            .iter()
            .filter_map(|a| a.summary.clone().map(|summary| (a.id.clone(), summary)))
            .collect();

        for article in articles.iter_mut().filter(|a| a.summary.is_none()) {
            article.summary = match known.get(&article.id) {
                Some(summary) => Some(summary.clone()),
                None => self
                    .storage
                    .get_article(&article.id)
                    .await?
                    .and_then(|stored| stored.summary),
            };
        }
        Ok(())
    }

    /// Refresh every subscribed feed.
    pub async fn refresh_all(&self) -> Result<RefreshOutcome> {
        let feeds = self.storage.list_feeds().await?;
        self.refresh(&feeds).await
    }

    pub async fn refresh(&self, feeds: &[Feed]) -> Result<RefreshOutcome> {
        let Some(_guard) = self.gate.try_begin() else {
            info!("⏳ Refresh already running, skipping");
            return Ok(RefreshOutcome::Skipped);
        };

        info!("📰 Refreshing {} feeds", feeds.len());
        let results = join_all(feeds.iter().map(|feed| async move {
            let result = self.fetch_feed(&feed.url).await;
            (feed, result)
        }))
        .await;

        let mut fetched = Vec::new();
        let mut errors = Vec::new();
        let mut touched = Vec::new();
        let now = Utc::now();
        for (feed, result) in results {
            match result {
                Ok(articles) => {
                    debug!("{} returned {} entries", feed.url, articles.len());
                    fetched.extend(articles);
                    let mut feed = feed.clone();
                    feed.last_fetch = Some(now);
                    touched.push(feed);
                }
                Err(error) => {
                    warn!("⚠️ Failed to load {}: {}", feed.url, error);
                    errors.push(FeedFailure {
                        feed: feed.clone(),
                        error,
                    });
                }
            }
        }
        if !touched.is_empty() {
            self.storage.upsert_feeds(&touched).await?;
        }

        let (articles, working_set_len) = self.ingest(fetched).await?;
        let evicted = self.storage.evict_stale(self.config.max_age_days).await?;

        info!(
            "✅ Refresh done: {} articles, {} failed feeds, {} evicted",
            articles.len(),
            errors.len(),
            evicted
        );
        Ok(RefreshOutcome::Completed(RefreshReport {
            articles,
            errors,
            evicted,
            working_set_len,
        }))
    }

    /// Subscribe to a feed after checking that it yields at least one entry.
    pub async fn add_feed(&self, url: &str, name: Option<&str>) -> Result<(Feed, usize)> {
        let parsed = validate_feed_url(url)?;
        let url = url.trim();
        if self.storage.get_feed(url).await?.is_some() {
            return Err(Error::FeedExists(url.to_string()));
        }

        info!("🔍 Checking {}", url);
        let articles = self.fetch_feed(url).await?;
        if articles.is_empty() {
            return Err(Error::EmptyFeed(url.to_string()));
        }

        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| articles.first().map(|a| a.feed_title.clone()))
            .unwrap_or_else(|| host_name(&parsed));
        let feed = Feed::new(url, name);
        self.storage.upsert_feeds(&[feed.clone()]).await?;

        let (articles, _) = self.ingest(articles).await?;
        info!("➕ Added {} with {} articles", feed.name, articles.len());
        Ok((feed, articles.len()))
    }

    /// Subscribe to the configured default feeds, skipping the ones that
    /// cannot be added.
    pub async fn add_default_feeds(&self) -> Result<Vec<Feed>> {
        let mut added = Vec::new();
        for default in &self.config.defaults {
            match self.add_feed(&default.url, Some(&default.name)).await {
                Ok((feed, _)) => added.push(feed),
                Err(Error::Storage(e)) => return Err(Error::Storage(e)),
                Err(e) => warn!("⚠️ Skipping default feed {}: {}", default.url, e),
            }
        }
        Ok(added)
    }

    /// Drop the subscription and its articles from the working set. Stored
    /// articles age out through eviction.
    pub async fn remove_feed(&self, url: &str) -> Result<()> {
        if self.storage.get_feed(url).await?.is_none() {
            return Err(Error::NotFound(format!("feed {}", url)));
        }
        self.storage.delete_feed(url).await?;
        self.working_set
            .write()
            .await
            .retain(|article| article.feed_url != url);
        info!("🗑️ Removed {}", url);
        Ok(())
    }

    /// First page of the working set, optionally limited to one topic.
    pub async fn articles(&self, topic: Option<&str>) -> Vec<Article> {
        let topic = topic.filter(|t| *t != ALL_TOPICS);
        self.working_set
            .read()
            .await
            .iter()
            .filter(|article| topic.map_or(true, |t| article.topic_or_other() == t))
            .take(self.config.page_size)
            .cloned()
            .collect()
    }

    pub async fn articles_for_feed(&self, url: &str) -> Vec<Article> {
        self.working_set
            .read()
            .await
            .iter()
            .filter(|article| article.feed_url == url)
            .cloned()
            .collect()
    }

    /// Working set first, then the store.
    pub async fn article(&self, id: &str) -> Result<Option<Article>> {
        let cached = self
            .working_set
            .read()
            .await
            .iter()
            .find(|article| article.id == id)
            .cloned();
        match cached {
            Some(article) => Ok(Some(article)),
            None => self.storage.get_article(id).await,
        }
    }

    pub async fn topics(&self) -> Vec<TopicCount> {
        self.classifier
            .topics_with_counts(&self.working_set.read().await)
    }

    pub async fn feeds_with_counts(&self) -> Result<Vec<(Feed, usize)>> {
        let feeds = self.storage.list_feeds().await?;
        let working_set = self.working_set.read().await;
        Ok(feeds
            .into_iter()
            .map(|feed| {
                let count = working_set.iter().filter(|a| a.feed_url == feed.url).count();
                (feed, count)
            })
            .collect())
    }

    pub async fn stats(&self) -> Result<Stats> {
        self.storage.stats().await
    }

    pub async fn similar(&self, id: &str, threshold: f64) -> Result<Vec<SimilarArticle>> {
        let target = self
            .article(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;
        Ok(find_similar(&target, &self.working_set.read().await, threshold))
    }

    pub async fn trending(&self, limit: usize) -> Vec<KeywordCount> {
        trending_keywords(&self.working_set.read().await, limit)
    }

    /// Store a generated summary on the article, both persisted and in the
    /// working set.
    pub async fn record_summary(&self, id: &str, summary: &str) -> Result<Article> {
        let mut article = self
            .article(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;
        article.summary = Some(summary.to_string());
        self.storage.upsert_articles(&[article.clone()]).await?;

        if let Some(cached) = self
            .working_set
            .write()
            .await
            .iter_mut()
            .find(|a| a.id == id)
        {
            cached.summary = article.summary.clone();
        }
        Ok(article)
    }
}

fn host_name(url: &url::Url) -> String {
    let host = url.host_str().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nt_core::Collection;
    use nt_storage::MemoryStorage;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockFetcher {
        payloads: Mutex<HashMap<String, String>>,
        delay: Option<Duration>,
    }

    impl MockFetcher {
        fn with(self, url: &str, payload: String) -> Self {
            self.payloads
                .lock()
                .unwrap()
                .insert(url.to_string(), payload);
            self
        }
    }

    #[async_trait]
    impl FeedFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.payloads
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Fetch(format!("{} returned HTTP 404", url)))
        }
    }

    fn rss(title: &str, items: &[(&str, &str)]) -> String {
        let items: String = items
            .iter()
            .map(|(title, date)| {
                format!(
                    "<item><title>{}</title><link>https://x/{}</link><pubDate>{}</pubDate></item>",
                    title,
                    title.replace(' ', "-"),
                    date
                )
            })
            .collect();
        format!("<rss><channel><title>{}</title>{}</channel></rss>", title, items)
    }

    fn recent(hours: i64) -> String {
        (Utc::now() - chrono::Duration::hours(hours)).to_rfc2822()
    }

    fn manager(fetcher: MockFetcher) -> (FeedManager, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let manager = FeedManager::new(
            storage.clone(),
            Arc::new(fetcher),
            TopicClassifier::default(),
            FeedsConfig {
                page_size: 2,
                ..FeedsConfig::default()
            },
        );
        (manager, storage)
    }

    #[tokio::test]
    async fn test_refresh_isolates_failures() {
        let fetcher = MockFetcher::default().with(
            "https://a/feed",
            rss(
                "A",
                &[
                    ("Rust release notes", &recent(1)),
                    ("Apple event recap", &recent(2)),
                    ("Security advisory published", &recent(3)),
                ],
            ),
        );
        let (manager, storage) = manager(fetcher);
        let feeds = vec![Feed::new("https://a/feed", "A"), Feed::new("https://b/feed", "B")];

        let RefreshOutcome::Completed(report) = manager.refresh(&feeds).await.unwrap() else {
            panic!("refresh was skipped");
        };
        assert_eq!(report.articles.len(), 3);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].feed.url, "https://b/feed");
        assert!(report.errors[0].error.is_feed_local());
        assert!(report.articles.iter().all(|a| a.topic.is_some()));

        assert_eq!(storage.count(Collection::News).await.unwrap(), 3);
        assert_eq!(report.working_set_len, 3);
        assert_eq!(manager.refresh_state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_working_set_truncated() {
        let words = ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot"];
        let items: Vec<(String, String)> = words
            .iter()
            .enumerate()
            .map(|(i, word)| (format!("Distinct headline {}", word), recent(i as i64)))
            .collect();
        let borrowed: Vec<(&str, &str)> = items.iter().map(|(t, d)| (t.as_str(), d.as_str())).collect();
        let fetcher = MockFetcher::default().with("https://a/feed", rss("A", &borrowed));
        let (manager, _) = manager(fetcher);

        manager.refresh(&[Feed::new("https://a/feed", "A")]).await.unwrap();
        let page = manager.articles(None).await;
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "Distinct headline alpha");
        // twice the page size is kept
        assert_eq!(manager.articles_for_feed("https://a/feed").await.len(), 4);
    }

    #[tokio::test]
    async fn test_refresh_merges_duplicates_with_working_set() {
        let fetcher = MockFetcher::default().with(
            "https://a/feed",
            rss("A", &[("Rust compiler update", &recent(5))]),
        );
        let (manager, _) = manager(fetcher);
        manager.refresh(&[Feed::new("https://a/feed", "A")]).await.unwrap();

        let fetcher_b = MockFetcher::default().with(
            "https://b/feed",
            rss("B", &[("update: Rust compiler!", &recent(1))]),
        );
        let manager = FeedManager {
            fetcher: Arc::new(fetcher_b),
            ..manager
        };
        manager.refresh(&[Feed::new("https://b/feed", "B")]).await.unwrap();

        let articles = manager.articles(None).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].feed_url, "https://b/feed");
    }

    #[tokio::test]
    async fn test_concurrent_refresh_is_skipped() {
        let fetcher = MockFetcher {
            delay: Some(Duration::from_millis(200)),
            ..MockFetcher::default()
        }
        .with("https://a/feed", rss("A", &[("Slow news", &recent(1))]));
        let (manager, _) = manager(fetcher);
        let feeds = vec![Feed::new("https://a/feed", "A")];

        let (first, second) = tokio::join!(manager.refresh(&feeds), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            manager.refresh(&feeds).await
        });
        assert!(matches!(first.unwrap(), RefreshOutcome::Completed(_)));
        assert!(matches!(second.unwrap(), RefreshOutcome::Skipped));
        assert_eq!(manager.refresh_state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_reported() {
        let fetcher = MockFetcher {
            delay: Some(Duration::from_secs(5)),
            ..MockFetcher::default()
        };
        let storage = Arc::new(MemoryStorage::new());
        let manager = FeedManager::new(
            storage,
            Arc::new(fetcher),
            TopicClassifier::default(),
            FeedsConfig {
                fetch_timeout_secs: 1,
                ..FeedsConfig::default()
            },
        );

        let RefreshOutcome::Completed(report) = manager
            .refresh(&[Feed::new("https://slow/feed", "Slow")])
            .await
            .unwrap()
        else {
            panic!("refresh was skipped");
        };
        assert!(matches!(report.errors[0].error, Error::Fetch(_)));
    }

    #[tokio::test]
    async fn test_add_feed_rejects_empty_and_duplicates() {
        let fetcher = MockFetcher::default()
            .with("https://empty/feed", rss("Empty", &[]))
            .with("https://a/feed", rss("Feed A", &[("Hello world news", &recent(1))]));
        let (manager, storage) = manager(fetcher);

        let err = manager.add_feed("https://empty/feed", None).await.unwrap_err();
        assert!(matches!(err, Error::EmptyFeed(_)));
        assert_eq!(storage.count(Collection::Feeds).await.unwrap(), 0);

        let (feed, count) = manager.add_feed("https://a/feed", None).await.unwrap();
        assert_eq!(feed.name, "Feed A");
        assert_eq!(count, 1);
        assert_eq!(manager.articles(None).await.len(), 1);

        let err = manager.add_feed("https://a/feed", Some("Again")).await.unwrap_err();
        assert!(matches!(err, Error::FeedExists(_)));

        let err = manager.add_feed("not a url", None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_remove_feed_drops_working_set_only() {
        let fetcher = MockFetcher::default()
            .with("https://a/feed", rss("A", &[("Hello world news", &recent(1))]));
        let (manager, storage) = manager(fetcher);
        manager.add_feed("https://a/feed", Some("Mine")).await.unwrap();

        manager.remove_feed("https://a/feed").await.unwrap();
        assert!(manager.articles(None).await.is_empty());
        assert_eq!(storage.count(Collection::News).await.unwrap(), 1);
        assert!(matches!(
            manager.remove_feed("https://a/feed").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_record_summary_updates_store_and_working_set() {
        let fetcher = MockFetcher::default()
            .with("https://a/feed", rss("A", &[("Hello world news", &recent(1))]));
        let (manager, storage) = manager(fetcher);
        manager.add_feed("https://a/feed", None).await.unwrap();
        let id = manager.articles(None).await[0].id.clone();

        manager.record_summary(&id, "Коротко").await.unwrap();
        assert_eq!(
            manager.article(&id).await.unwrap().unwrap().summary.as_deref(),
            Some("Коротко")
        );
        assert_eq!(
            storage.get_article(&id).await.unwrap().unwrap().summary.as_deref(),
            Some("Коротко")
        );
        assert!(matches!(
            manager.record_summary("missing", "x").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_keeps_generated_summary() {
        let fetcher = MockFetcher::default()
            .with("https://a/feed", rss("A", &[("Hello world news", &recent(1))]));
        let (manager, storage) = manager(fetcher);
        manager.add_feed("https://a/feed", None).await.unwrap();
        let id = manager.articles(None).await[0].id.clone();
        manager.record_summary(&id, "Коротко").await.unwrap();

        manager.refresh_all().await.unwrap();
        assert_eq!(
            storage.get_article(&id).await.unwrap().unwrap().summary.as_deref(),
            Some("Коротко")
        );
        assert_eq!(
            manager.articles(None).await[0].summary.as_deref(),
            Some("Коротко")
        );

        // a fresh manager only knows the stored copy
        let fetcher = MockFetcher::default()
            .with("https://a/feed", rss("A", &[("Hello world news", &recent(1))]));
        let reopened = FeedManager::new(
            storage.clone(),
            Arc::new(fetcher),
            TopicClassifier::default(),
            FeedsConfig::default(),
        );
        reopened.refresh_all().await.unwrap();
        assert_eq!(
            storage.get_article(&id).await.unwrap().unwrap().summary.as_deref(),
            Some("Коротко")
        );
    }

    #[tokio::test]
    async fn test_load_and_views() {
        let fetcher = MockFetcher::default().with(
            "https://a/feed",
            rss(
                "A",
                &[
                    ("OpenAI ships new GPT model", &recent(1)),
                    ("OpenAI ships new GPT model today", &recent(2)),
                ],
            ),
        );
        let (manager, storage) = manager(fetcher);
        manager.add_feed("https://a/feed", None).await.unwrap();

        let fresh = FeedManager::new(
            storage.clone(),
            Arc::new(MockFetcher::default()),
            TopicClassifier::default(),
            FeedsConfig::default(),
        );
        assert_eq!(fresh.load().await.unwrap(), 2);

        let topics = fresh.topics().await;
        assert_eq!(topics[0].id, ALL_TOPICS);
        assert_eq!(topics[1].id, "ai");
        assert_eq!(fresh.articles(Some("ai")).await.len(), 2);
        assert_eq!(fresh.articles(Some("all")).await.len(), 2);

        let first = fresh.articles(None).await[0].clone();
        let similar = fresh.similar(&first.id, 0.6).await.unwrap();
        assert_eq!(similar.len(), 1);

        let feeds = fresh.feeds_with_counts().await.unwrap();
        assert_eq!(feeds[0].1, 2);
        assert_eq!(fresh.stats().await.unwrap().total_news, 2);
        assert_eq!(fresh.trending(1).await[0].word, "openai");
    }

    #[tokio::test]
    async fn test_add_default_feeds_skips_failures() {
        let fetcher = MockFetcher::default()
            .with("https://a/feed", rss("A", &[("Hello world news", &recent(1))]));
        let storage = Arc::new(MemoryStorage::new());
        let mut config = FeedsConfig::default();
        config.defaults = vec![
            nt_core::config::DefaultFeed {
                name: "A".to_string(),
                url: "https://a/feed".to_string(),
            },
            nt_core::config::DefaultFeed {
                name: "Down".to_string(),
                url: "https://down/feed".to_string(),
            },
        ];
        let manager = FeedManager::new(
            storage.clone(),
            Arc::new(fetcher),
            TopicClassifier::default(),
            config,
        );

        let added = manager.add_default_feeds().await.unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].name, "A");
        assert_eq!(storage.list_feeds().await.unwrap().len(), 1);
    }

    #[test]
    fn test_host_name() {
        let url = url::Url::parse("https://www.example.com/feed").unwrap();
        assert_eq!(host_name(&url), "example.com");
    }
}
