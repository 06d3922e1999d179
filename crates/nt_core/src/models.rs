use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::types::Article;
use crate::Result;

/// Lazy, finite, single-use sequence of generated text fragments.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[async_trait]
pub trait InferenceModel: Send + Sync {
    fn name(&self) -> &str;

    /// Short summary of a single article.
    async fn summarize_article(&self, article: &Article) -> Result<String>;

    /// Structured digest of the articles of one topic.
    async fn summarize_topic(&self, topic: &str, articles: &[Article]) -> Result<String>;

    /// Same digest as [`InferenceModel::summarize_topic`], delivered as it is
    /// generated.
    async fn stream_topic_summary(&self, topic: &str, articles: &[Article]) -> Result<TextStream>;
}
