use std::path::Path;
use std::sync::Arc;

use nt_core::{ArticleStorage, Error, Result};

pub mod backends;
pub mod cache;
pub mod settings;

pub use backends::*;
pub use cache::SummaryCache;
pub use settings::Settings;

pub trait StorageBackend: Send + Sync {
    fn name(&self) -> &'static str;
}

/// Opens the backend named in the configuration.
pub async fn create_storage(backend: &str, path: &Path) -> Result<Arc<dyn ArticleStorage>> {
    match backend {
        "memory" => {
            tracing::debug!("Using in-memory storage");
            Ok(Arc::new(MemoryStorage::new()))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            tracing::debug!("Opening SQLite storage at {}", path.display());
            Ok(Arc::new(SQLiteStorage::new_with_path(path).await?))
        }
        other => {
            let _ = path;
            Err(Error::Config(format!(
                "storage backend '{}' is not available in this build",
                other
            )))
        }
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend, SummaryCache, Settings};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage("memory", Path::new("unused")).await.unwrap();
        assert_eq!(storage.count(nt_core::Collection::News).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_backend() {
        let result = create_storage("qdrant", Path::new("unused")).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
