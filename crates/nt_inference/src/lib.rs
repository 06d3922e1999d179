use nt_core::config::InferenceConfig;

pub mod digest;
pub mod models;
pub mod prompts;

pub use digest::{SummaryService, TopicDigest};
pub use models::create_model;

/// Environment variable consulted when no key is stored or configured.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Clone)]
pub struct Config {
    pub provider: String,
    pub api_url: String,
    pub model_name: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("model_name", &self.model_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from(&InferenceConfig::default())
    }
}

impl From<&InferenceConfig> for Config {
    fn from(config: &InferenceConfig) -> Self {
        Self {
            provider: config.provider.clone(),
            api_url: config.api_url.clone(),
            model_name: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

impl Config {
    /// Picks the key from the stored settings, then the config file, then
    /// the environment.
    pub fn with_api_key(mut self, stored: Option<String>) -> Self {
        self.api_key = resolve_api_key(stored, self.api_key.take(), std::env::var(API_KEY_ENV).ok());
        self
    }
}

pub fn resolve_api_key(
    stored: Option<String>,
    configured: Option<String>,
    env: Option<String>,
) -> Option<String> {
    [stored, configured, env]
        .into_iter()
        .flatten()
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

pub mod prelude {
    pub use super::models::create_model;
    pub use super::{Config, SummaryService};
    pub use nt_core::{Article, Error, InferenceModel, Result};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_key_order() {
        let some = |s: &str| Some(s.to_string());
        assert_eq!(resolve_api_key(some("a"), some("b"), some("c")), some("a"));
        assert_eq!(resolve_api_key(None, some("b"), some("c")), some("b"));
        assert_eq!(resolve_api_key(some("  "), None, some("c")), some("c"));
        assert_eq!(resolve_api_key(None, None, None), None);
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = Config {
            api_key: Some("gsk_secret".to_string()),
            ..Config::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("gsk_secret"));
        assert!(debug.contains("llama-3.3-70b-versatile"));
    }
}
