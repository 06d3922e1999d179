use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use nt_core::config::FeedsConfig;
use nt_core::{Error, Result};
use reqwest::Client;
use url::Url;

/// Retrieves the raw payload of a feed.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Absolute http(s) URLs only.
pub fn validate_feed_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| Error::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(Error::InvalidUrl(raw.to_string())),
    }
}

pub struct HttpFetcher {
    client: Client,
    proxy_base: Option<String>,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &FeedsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            proxy_base: config.proxy_base.clone().filter(|base| !base.is_empty()),
            max_bytes: config.max_feed_bytes,
        })
    }

    /// The URL actually requested, routed through the relay when one is set.
    pub fn request_url(&self, feed_url: &str) -> String {
        match &self.proxy_base {
            Some(base) => format!("{}{}", base, urlencoding::encode(feed_url)),
            None => feed_url.to_string(),
        }
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let target = self.request_url(url);
        tracing::debug!("GET {}", target);

        let response = self.client.get(&target).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("{} returned HTTP {}", url, status.as_u16())));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if body.len() + chunk.len() > self.max_bytes {
                return Err(Error::Fetch(format!(
                    "{} exceeds the {} byte limit",
                    url, self.max_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
