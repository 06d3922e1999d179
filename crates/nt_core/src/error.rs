use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid feed format: {0}")]
    Format(String),

    #[error("Feed is empty or unavailable: {0}")]
    EmptyFeed(String),

    #[error("Feed already subscribed: {0}")]
    FeedExists(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Auth(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Whether the failure only concerns a single feed and can be reported
    /// next to partial results.
    pub fn is_feed_local(&self) -> bool {
        matches!(
            self,
            Error::Fetch(_) | Error::Http(_) | Error::Format(_) | Error::EmptyFeed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
