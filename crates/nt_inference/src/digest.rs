//! Topic digests with per-day caching, and single article summaries.

use std::sync::Arc;

use futures::StreamExt;
use nt_core::{Article, InferenceModel, Result};
use nt_storage::SummaryCache;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct TopicDigest {
    pub topic: String,
    pub content: String,
    /// Served from today's cache entry without calling the model.
    pub cached: bool,
}

pub struct SummaryService {
    model: Arc<dyn InferenceModel>,
    cache: SummaryCache,
}

impl SummaryService {
    pub fn new(model: Arc<dyn InferenceModel>, cache: SummaryCache) -> Self {
        Self { model, cache }
    }

    pub fn model(&self) -> &Arc<dyn InferenceModel> {
        &self.model
    }

    /// Digest of `articles` for `topic`, streamed through `on_chunk` while it
    /// is generated. A topic without articles yields `None`. The result is
    /// cached only once the whole stream succeeded.
    pub async fn topic_digest<F>(
        &self,
        topic: &str,
        label: &str,
        articles: &[Article],
        mut on_chunk: F,
    ) -> Result<Option<TopicDigest>>
    where
        F: FnMut(&str) + Send,
    {
        if articles.is_empty() {
            return Ok(None);
        }

        if let Some(entry) = self.cache.get_today(topic).await? {
            debug!("Digest cache hit for {}", entry.id);
            return Ok(Some(TopicDigest {
                topic: topic.to_string(),
                content: entry.content,
                cached: true,
            }));
        }

        info!("🤖 Generating digest for {} ({} articles)", topic, articles.len());
        let mut stream = self.model.stream_topic_summary(label, articles).await?;
        let mut content = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            on_chunk(&fragment);
            content.push_str(&fragment);
        }

        self.cache.put_today(topic, &content).await?;
        info!("✨ Digest for {} cached", topic);
        Ok(Some(TopicDigest {
            topic: topic.to_string(),
            content,
            cached: false,
        }))
    }

    pub async fn summarize_article(&self, article: &Article) -> Result<String> {
        info!("🤖 Summarizing {}", article.title);
        self.model.summarize_article(article).await
    }
}
