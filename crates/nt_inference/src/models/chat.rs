//! OpenAI-compatible chat-completions client (Groq by default).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{future, Stream, StreamExt};
use nt_core::{Article, Error, InferenceModel, Result, TextStream};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::prompts;
use crate::Config;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: Option<Delta>,
}

#[derive(Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

pub struct ChatModel {
    client: Arc<Client>,
    api_key: Option<String>,
    api_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatModel {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: Arc::new(Client::builder().build()?),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            api_url: config.api_url.clone(),
            model: config.model_name.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            Error::Auth("API key is not configured, set one with `nt settings set-key`".to_string())
        })
    }

    async fn send(&self, messages: &[ChatMessage], max_tokens: Option<u32>, stream: bool) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: max_tokens.unwrap_or(self.max_tokens),
            stream,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response)
    }

    /// Single reply; a missing content field yields an empty string.
    pub async fn chat(&self, messages: &[ChatMessage], max_tokens: Option<u32>) -> Result<String> {
        let response = self
            .send(messages, max_tokens, false)
            .await?
            .json::<ChatResponse>()
            .await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default())
    }

    /// Reply delivered fragment by fragment.
    pub async fn stream_chat(&self, messages: &[ChatMessage], max_tokens: Option<u32>) -> Result<TextStream> {
        let response = self.send(messages, max_tokens, true).await?;
        Ok(parse_chat_stream(response.bytes_stream()))
    }

    /// Sends a one-word question and returns the reply.
    pub async fn test_connection(&self) -> Result<String> {
        self.chat(&prompts::connection_check(), Some(10)).await
    }
}

async fn api_error(response: reqwest::Response) -> Error {
    let status = response.status();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .and_then(|error| error.message);
    Error::Inference(message.unwrap_or_else(|| format!("API error: {}", status.as_u16())))
}

/// SSE `data:` frames to text fragments. Stops at `[DONE]`, skips frames
/// that are not valid chunks and drops empty deltas.
pub fn parse_chat_stream<S, B, E>(bytes: S) -> TextStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let stream = bytes
        .eventsource()
        .take_while(|event| {
            let done = matches!(event, Ok(event) if event.data.trim() == "[DONE]");
            future::ready(!done)
        })
        .filter_map(|event| async move {
            match event {
                Ok(event) => {
                    let chunk: StreamChunk = match serde_json::from_str(&event.data) {
                        Ok(chunk) => chunk,
                        Err(e) => {
                            tracing::debug!("Skipping malformed frame: {}", e);
                            return None;
                        }
                    };
                    let content = chunk.choices.into_iter().next()?.delta?.content?;
                    (!content.is_empty()).then_some(Ok(content))
                }
                Err(e) => Some(Err(Error::Inference(format!("stream error: {}", e)))),
            }
        });
    Box::pin(stream)
}

impl fmt::Debug for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl InferenceModel for ChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn summarize_article(&self, article: &Article) -> Result<String> {
        self.chat(
            &prompts::article_summary(article),
            Some(prompts::ARTICLE_MAX_TOKENS),
        )
        .await
    }

    async fn summarize_topic(&self, topic: &str, articles: &[Article]) -> Result<String> {
        self.chat(
            &prompts::topic_digest(topic, articles),
            Some(prompts::DIGEST_MAX_TOKENS),
        )
        .await
    }

    async fn stream_topic_summary(&self, topic: &str, articles: &[Article]) -> Result<TextStream> {
        self.stream_chat(
            &prompts::topic_digest(topic, articles),
            Some(prompts::DIGEST_MAX_TOKENS),
        )
        .await
    }
}
