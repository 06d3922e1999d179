use std::fmt;

use futures::stream;
use nt_core::{Article, InferenceModel, Result, TextStream};

/// Offline model that echoes the source text. Useful without an API key.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn summarize_article(&self, article: &Article) -> Result<String> {
        let source = if article.content.is_empty() {
            &article.description
        } else {
            &article.content
        };
        // Take first 20 words and join them
        let words: Vec<&str> = source.split_whitespace().take(20).collect();
        Ok(words.join(" "))
    }

    async fn summarize_topic(&self, topic: &str, articles: &[Article]) -> Result<String> {
        let mut digest = format!("📌 {}", topic);
        for article in articles.iter().take(crate::prompts::DIGEST_ARTICLE_LIMIT) {
            digest.push_str("\n• ");
            digest.push_str(&article.title);
        }
        Ok(digest)
    }

    async fn stream_topic_summary(&self, topic: &str, articles: &[Article]) -> Result<TextStream> {
        let digest = self.summarize_topic(topic, articles).await?;
        let fragments: Vec<Result<String>> = digest
            .split_inclusive('\n')
            .map(|line| Ok(line.to_string()))
            .collect();
        Ok(Box::pin(stream::iter(fragments)))
    }
}
