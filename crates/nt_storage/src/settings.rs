use nt_core::{ArticleStorage, Result};
use serde_json::Value;

pub const API_KEY: &str = "api_key";
pub const REFRESH_INTERVAL: &str = "refresh_interval";
pub const AUTO_SUMMARIZE: &str = "auto_summarize";

/// User preferences persisted in the settings collection.
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub api_key: Option<String>,
    /// Minutes between periodic refreshes.
    pub refresh_interval: u64,
    pub auto_summarize: bool,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("refresh_interval", &self.refresh_interval)
            .field("auto_summarize", &self.auto_summarize)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            refresh_interval: 30,
            auto_summarize: true,
        }
    }
}

impl Settings {
    /// Reads every known key, falling back to the default for missing or
    /// mistyped values.
    pub async fn load(storage: &dyn ArticleStorage) -> Result<Self> {
        let defaults = Self::default();
        let api_key = storage
            .get_setting(API_KEY)
            .await?
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|key| !key.is_empty());
        let refresh_interval = storage
            .get_setting(REFRESH_INTERVAL)
            .await?
            .and_then(|v| v.as_u64())
            .unwrap_or(defaults.refresh_interval);
        let auto_summarize = storage
            .get_setting(AUTO_SUMMARIZE)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(defaults.auto_summarize);

        Ok(Self {
            api_key,
            refresh_interval,
            auto_summarize,
        })
    }

    pub async fn save(&self, storage: &dyn ArticleStorage) -> Result<()> {
        match &self.api_key {
            Some(key) => storage.put_setting(API_KEY, &Value::from(key.as_str())).await?,
            None => storage.put_setting(API_KEY, &Value::Null).await?,
        }
        storage
            .put_setting(REFRESH_INTERVAL, &Value::from(self.refresh_interval))
            .await?;
        storage
            .put_setting(AUTO_SUMMARIZE, &Value::Bool(self.auto_summarize))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    #[tokio::test]
    async fn test_defaults_when_empty() {
        let storage = MemoryStorage::new();
        let settings = Settings::load(&storage).await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.refresh_interval, 30);
        assert!(settings.auto_summarize);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let settings = Settings {
            api_key: Some("gsk_secret".to_string()),
            refresh_interval: 15,
            auto_summarize: false,
        };
        settings.save(&storage).await.unwrap();

        assert_eq!(Settings::load(&storage).await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_mistyped_value_falls_back() {
        let storage = MemoryStorage::new();
        storage
            .put_setting(REFRESH_INTERVAL, &Value::from("soon"))
            .await
            .unwrap();
        assert_eq!(Settings::load(&storage).await.unwrap().refresh_interval, 30);
    }

    #[test]
    fn test_debug_redacts_key() {
        let settings = Settings {
            api_key: Some("gsk_secret".to_string()),
            ..Settings::default()
        };
        assert!(!format!("{:?}", settings).contains("gsk_secret"));
    }
}
