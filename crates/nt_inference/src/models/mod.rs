use std::sync::Arc;

use nt_core::{Error, InferenceModel, Result};

use crate::Config;

pub mod chat;
pub mod dummy;

pub use chat::{ChatMessage, ChatModel};
pub use dummy::DummyModel;

pub fn create_model(config: &Config) -> Result<Arc<dyn InferenceModel>> {
    match config.provider.as_str() {
        "groq" | "openai" => {
            tracing::debug!("Using chat model {} at {}", config.model_name, config.api_url);
            Ok(Arc::new(ChatModel::new(config)?))
        }
        "dummy" => Ok(Arc::new(DummyModel::new())),
        other => Err(Error::Config(format!("unknown inference provider '{}'", other))),
    }
}
