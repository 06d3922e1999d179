//! Application configuration.
//!
//! Every field has a default, so an empty or missing file yields a usable
//! configuration. Values are read from TOML:
//!
//! ```toml
//! [storage]
//! backend = "sqlite"
//! path = "news.db"
//!
//! [feeds]
//! proxy_base = "https://api.allorigins.win/raw?url="
//! page_size = 50
//!
//! [inference]
//! provider = "groq"
//! model = "llama-3.3-70b-versatile"
//!
//! [[topics]]
//! id = "rust"
//! name = "Rust"
//! keywords = ["rust", "cargo"]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub feeds: FeedsConfig,
    pub inference: InferenceConfig,
    /// Replaces the built-in topic table when present.
    pub topics: Option<Vec<TopicConfig>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `sqlite` or `memory`.
    pub backend: String,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            path: PathBuf::from("news.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    /// Relay prefix; the url-encoded feed URL is appended to it.
    pub proxy_base: Option<String>,
    pub fetch_timeout_secs: u64,
    pub max_concurrent_fetches: usize,
    pub max_feed_bytes: usize,
    pub page_size: usize,
    pub max_age_days: i64,
    pub user_agent: String,
    pub defaults: Vec<DefaultFeed>,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            proxy_base: None,
            fetch_timeout_secs: 15,
            max_concurrent_fetches: 8,
            max_feed_bytes: 5 * 1024 * 1024,
            page_size: 50,
            max_age_days: 7,
            user_agent: concat!("nt/", env!("CARGO_PKG_VERSION")).to_string(),
            defaults: default_feeds(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DefaultFeed {
    pub name: String,
    pub url: String,
}

fn default_feeds() -> Vec<DefaultFeed> {
    [
        ("Habr", "https://habr.com/ru/rss/articles/?fl=ru"),
        ("TechCrunch", "https://techcrunch.com/feed/"),
        ("Hacker News", "https://hnrss.org/frontpage"),
        ("The Verge", "https://www.theverge.com/rss/index.xml"),
        ("OpenAI Blog", "https://openai.com/blog/rss.xml"),
    ]
    .into_iter()
    .map(|(name, url)| DefaultFeed {
        name: name.to_string(),
        url: url.to_string(),
    })
    .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// `groq` (any OpenAI-compatible endpoint) or `dummy`.
    pub provider: String,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub api_key: Option<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopicConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    /// Longer name used in digest prompts, defaults to `name`.
    #[serde(default)]
    pub label: Option<String>,
    pub keywords: Vec<String>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        match self.storage.backend.as_str() {
            "sqlite" | "memory" => {}
            other => {
                return Err(Error::Config(format!(
                    "unknown storage backend '{}', expected sqlite or memory",
                    other
                )))
            }
        }
        if self.feeds.page_size == 0 {
            return Err(Error::Config("feeds.page_size must be > 0".to_string()));
        }
        if self.feeds.max_concurrent_fetches == 0 {
            return Err(Error::Config(
                "feeds.max_concurrent_fetches must be > 0".to_string(),
            ));
        }
        if self.feeds.fetch_timeout_secs == 0 {
            return Err(Error::Config(
                "feeds.fetch_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.feeds.max_age_days < 1 {
            return Err(Error::Config("feeds.max_age_days must be >= 1".to_string()));
        }
        if !(0.0..=2.0).contains(&self.inference.temperature) {
            return Err(Error::Config(
                "inference.temperature must be in [0.0, 2.0]".to_string(),
            ));
        }
        if let Some(topics) = &self.topics {
            if topics.is_empty() {
                return Err(Error::Config("topics must not be empty when set".to_string()));
            }
            for topic in topics {
                if topic.id == crate::OTHER_TOPIC || topic.id == crate::ALL_TOPICS {
                    return Err(Error::Config(format!(
                        "topic id '{}' is reserved",
                        topic.id
                    )));
                }
            }
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("failed to read {}: {}", path.display(), e))
    })?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
    config.validate()?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.feeds.page_size, 50);
        assert_eq!(config.feeds.max_age_days, 7);
        assert_eq!(config.feeds.defaults.len(), 5);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[feeds]\npage_size = 20\n\n[inference]\nprovider = \"dummy\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.feeds.page_size, 20);
        assert_eq!(config.feeds.max_age_days, 7);
        assert_eq!(config.inference.provider, "dummy");
        assert_eq!(config.storage.backend, "sqlite");
    }

    #[test]
    fn test_rejects_reserved_topic_id() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[topics]]\nid = \"other\"\nname = \"Other\"\nkeywords = [\"x\"]"
        )
        .unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let mut config = Config::default();
        config.storage.backend = "qdrant".to_string();
        assert!(config.validate().is_err());
    }
}
