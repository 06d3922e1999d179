pub mod classifier;
pub mod dedup;
pub mod fetcher;
pub mod html;
pub mod logging;
pub mod manager;
pub mod normalizer;
pub mod xml;

pub use classifier::{KeywordCount, Topic, TopicClassifier, TopicCount, TopicTable};
pub use dedup::{deduplicate, find_similar, SimilarArticle};
pub use fetcher::{FeedFetcher, HttpFetcher};
pub use logging::init_logging;
pub use manager::{FeedFailure, FeedManager, RefreshOutcome, RefreshReport, RefreshState};
pub use normalizer::parse_feed;

pub mod prelude {
    pub use super::{FeedFetcher, FeedManager, RefreshOutcome, TopicClassifier};
    pub use nt_core::{Article, Error, Feed, Result};
}
