pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod types;

pub use config::Config;
pub use error::Error;
pub use models::{InferenceModel, TextStream};
pub use storage::ArticleStorage;
pub use types::{
    Article, ArticleQuery, Collection, Feed, Setting, Stats, SummaryCacheEntry, ALL_TOPICS,
    OTHER_TOPIC,
};

pub type Result<T> = std::result::Result<T, Error>;
