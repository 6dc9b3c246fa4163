//! Chat-completions gateway client.
//!
//! Speaks the OpenAI-compatible chat completions wire shape over HTTP.
//! The gateway is the only generation backend; both keyword synthesis
//! and answer streaming go through it.

use crate::error::QueryError;
use crate::models::ChatMessage;
use crate::traits::{CompletionStream, TextGenerator};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::pin::Pin;
use std::time::Duration;
use url::Url;

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 2_048;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

pub struct AiGateway {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl AiGateway {
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, QueryError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: Url::parse(endpoint)?,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn request_body(&self, messages: &[ChatMessage], stream: bool) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "stream": stream,
        })
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response, QueryError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &details));
        }

        Ok(response)
    }
}

/// Maps gateway failure statuses onto their dedicated variants so the
/// serving layer can relay them verbatim. Anything else is a generic
/// generation failure.
fn error_for_status(status: StatusCode, details: &str) -> QueryError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => QueryError::RateLimited,
        StatusCode::PAYMENT_REQUIRED => QueryError::QuotaExhausted,
        _ => QueryError::Generation(format!("gateway returned {status}: {details}")),
    }
}

#[derive(Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamFrame {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

/// Extracts the content delta from one SSE `data:` payload. Frames
/// without content (role announcements, finish markers) yield `None`.
fn content_delta(payload: &str) -> Option<String> {
    let frame: StreamFrame = match serde_json::from_str(payload) {
        Ok(frame) => frame,
        Err(error) => {
            tracing::warn!(%error, "skipping malformed stream frame");
            return None;
        }
    };

    frame
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
}

struct SseState {
    upstream: Pin<Box<dyn Stream<Item = Result<Bytes, QueryError>> + Send>>,
    buffer: String,
}

/// Relays content deltas from an SSE byte stream line by line. The
/// gateway terminates a healthy stream with a `data: [DONE]` sentinel;
/// an upstream end without it means the completion was cut off, and the
/// relay's final item is `QueryError::Truncated`.
fn relay_deltas<S, E>(upstream: S) -> CompletionStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<QueryError> + Send + 'static,
{
    let state = SseState {
        upstream: Box::pin(upstream.map(|item| item.map_err(Into::into))),
        buffer: String::new(),
    };

    let stream = futures::stream::try_unfold(state, |mut state| async move {
        loop {
            while let Some(newline) = state.buffer.find('\n') {
                let line: String = state.buffer.drain(..=newline).collect();
                let line = line.trim();

                let Some(payload) = line.strip_prefix("data: ") else {
                    continue;
                };
                if payload == "[DONE]" {
                    return Ok(None);
                }
                if let Some(content) = content_delta(payload) {
                    return Ok(Some((content, state)));
                }
            }

            match state.upstream.next().await {
                Some(Ok(bytes)) => state.buffer.push_str(&String::from_utf8_lossy(&bytes)),
                Some(Err(error)) => return Err(error),
                None => return Err(QueryError::Truncated),
            }
        }
    });

    Box::pin(stream)
}

#[async_trait]
impl TextGenerator for AiGateway {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, QueryError> {
        let body = self.request_body(messages, false);
        let response = self.post(&body).await?;

        let parsed: CompletionBody = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(content)
    }

    async fn stream(&self, messages: &[ChatMessage]) -> Result<CompletionStream, QueryError> {
        let body = self.request_body(messages, true);
        let response = self.post(&body).await?;
        Ok(relay_deltas(response.bytes_stream()))
    }
}
