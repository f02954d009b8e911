use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::ZoeyConfig;
use crate::errors::{ZoeyError, ZoeyResult};
use crate::types::*;

/// Lazily produced text fragments of a streaming completion
pub type TextStream = BoxStream<'static, ZoeyResult<String>>;

/// Seam between the dialogue logic and the upstream completion endpoint
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Issue one request and return the content of the first choice
    async fn complete(&self, request: ChatCompletionRequest) -> ZoeyResult<String>;

    /// Issue one streaming request and yield `delta.content` fragments as they arrive
    async fn stream(&self, request: ChatCompletionRequest) -> ZoeyResult<TextStream>;
}

/// Client for OpenAI-compatible chat completion endpoints
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CompletionClient {
    /// Create a new completion client
    pub fn new(config: &ZoeyConfig) -> ZoeyResult<Self> {
        let provider = config.provider();
        let api_key = config.api_key.clone().filter(|k| !k.trim().is_empty());

        if provider.requires_api_key() && api_key.is_none() {
            return Err(ZoeyError::ConfigError(format!(
                "API key is required to initialize the {} client",
                provider
            )));
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ZoeyError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            api_key,
        })
    }

    /// Full URL of the chat completions endpoint
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send(&self, request: &ChatCompletionRequest) -> ZoeyResult<reqwest::Response> {
        let url = self.endpoint();
        debug!(url = %url, model = %request.model, messages = request.messages.len(), "Sending completion request");

        let mut builder = self.client.post(&url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ZoeyError::RequestError(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.map_err(|e| {
                ZoeyError::ResponseError(format!("Failed to read error response: {}", e))
            })?;

            warn!(status = status.as_u16(), "Completion endpoint returned an error");
            return Err(ZoeyError::HttpError {
                status_code: status.as_u16(),
                message: format!("API request failed: {}", error_body),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatCompletion for CompletionClient {
    async fn complete(&self, request: ChatCompletionRequest) -> ZoeyResult<String> {
        let mut request = request;
        request.stream = None;

        let response = self.send(&request).await?;
        let body = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| ZoeyError::ParsingError(format!("Failed to parse response: {}", e)))?;

        body.text()
            .map(str::to_string)
            .ok_or_else(|| ZoeyError::ResponseError("No content in first choice".to_string()))
    }

    async fn stream(&self, request: ChatCompletionRequest) -> ZoeyResult<TextStream> {
        let mut request = request;
        request.stream = Some(true);

        let response = self.send(&request).await?;
        let mut bytes = Box::pin(response.bytes_stream());

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::default();
            'read: while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ZoeyError::StreamError(format!("Failed to read stream: {}", e)));
                        break 'read;
                    }
                };

                for event in decoder.feed(&chunk) {
                    match event {
                        SseEvent::Delta(text) => yield Ok::<String, ZoeyError>(text),
                        SseEvent::Done => break 'read,
                    }
                }
            }
        };

        Ok(stream.boxed())
    }
}

/// Event decoded from a completion event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Delta(String),
    Done,
}

/// Incremental decoder for `data:` lines of a completion event stream
///
/// Bytes may arrive split at arbitrary positions, including inside a UTF-8
/// sequence, so undecoded bytes are kept until a full line is available.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed raw bytes, returning every event completed by them
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = parse_sse_line(line.trim()) {
                events.push(event);
            }
        }
        events
    }
}

/// Parse one trimmed line of the event stream
pub fn parse_sse_line(line: &str) -> Option<SseEvent> {
    let data = line.strip_prefix("data:")?.trim_start();

    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(SseEvent::Delta),
        Err(e) => {
            debug!(error = %e, "Skipping undecodable stream event");
            None
        }
    }
}
