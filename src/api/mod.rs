// Gemini generateContent client

pub mod types;

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{BoxStream, Stream, StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

use crate::models::AppConfig;
pub use types::{
    BlockThreshold, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    Part, Role, SafetySetting,
};

/// Everything that can go wrong talking to the model.
///
/// Callers only ever show the `Display` text; the variants exist for logging.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Failed to send generate request: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to parse generate response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Stream error: {0}")]
    Stream(String),
    #[error("Prompt was blocked: {0}")]
    Blocked(String),
    #[error("The model returned an empty response")]
    EmptyResponse,
}

impl GenerateContentResponse {
    /// Non-empty text of the first candidate, or the reason there is none
    pub fn into_text(self) -> Result<String, GenerateError> {
        match self.text() {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(self.block_reason().map_or(GenerateError::EmptyResponse, |reason| {
                GenerateError::Blocked(reason.to_string())
            })),
        }
    }
}

/// The two operations a view-model needs from a generative model.
#[cfg_attr(test, mockall::automock)]
pub trait GenerativeModel: Send + Sync {
    /// Single-shot generation over the given conversation turns
    fn generate_content(
        &self,
        contents: Vec<Content>,
    ) -> BoxFuture<'static, Result<GenerateContentResponse, GenerateError>>;

    /// Streaming generation; each item carries the next text increment
    fn generate_content_stream(
        &self,
        contents: Vec<Content>,
    ) -> BoxStream<'static, Result<GenerateContentResponse, GenerateError>>;
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model_name: String,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model_name: config.model_name.clone(),
            generation_config: config.generation.clone(),
            safety_settings: config.safety_settings.clone(),
            client,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{method}", self.base_url, self.model_name)
    }

    fn build_request(&self, contents: Vec<Content>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents,
            generation_config: Some(self.generation_config.clone()),
            safety_settings: self.safety_settings.clone(),
        }
    }

    async fn post(
        &self,
        url: &str,
        contents: Vec<Content>,
    ) -> Result<reqwest::Response, GenerateError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_request(contents))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Status { status, body });
        }

        Ok(response)
    }

    pub async fn generate(
        &self,
        contents: Vec<Content>,
    ) -> Result<GenerateContentResponse, GenerateError> {
        let url = self.endpoint("generateContent");
        tracing::debug!(model = %self.model_name, "sending generateContent request");

        let bytes = self.post(&url, contents).await?.bytes().await?;
        let response: GenerateContentResponse = serde_json::from_slice(&bytes)?;
        tracing::debug!(
            finish_reason = ?response.candidates.first().and_then(|c| c.finish_reason.as_deref()),
            "generateContent response received"
        );
        Ok(response)
    }

    /// Open a server-sent-events stream of partial responses
    pub async fn generate_stream(
        &self,
        contents: Vec<Content>,
    ) -> Result<BoxStream<'static, Result<GenerateContentResponse, GenerateError>>, GenerateError>
    {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        tracing::debug!(model = %self.model_name, "opening streamGenerateContent request");

        let response = self.post(&url, contents).await?;
        Ok(sse_events(Box::pin(response.bytes_stream())).boxed())
    }
}

impl GenerativeModel for GeminiClient {
    fn generate_content(
        &self,
        contents: Vec<Content>,
    ) -> BoxFuture<'static, Result<GenerateContentResponse, GenerateError>> {
        let client = self.clone();
        async move { client.generate(contents).await }.boxed()
    }

    fn generate_content_stream(
        &self,
        contents: Vec<Content>,
    ) -> BoxStream<'static, Result<GenerateContentResponse, GenerateError>> {
        let client = self.clone();
        futures::stream::once(async move { client.generate_stream(contents).await })
            .try_flatten()
            .boxed()
    }
}

/// Decode one SSE line; only `data:` lines carry a payload
fn parse_sse_line(line: &str) -> Option<Result<GenerateContentResponse, GenerateError>> {
    let payload = line.trim().strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }
    Some(serde_json::from_str(payload).map_err(GenerateError::from))
}

/// Split a byte stream into SSE lines, buffering partial lines across chunks
fn sse_events<S, B, E>(
    byte_stream: S,
) -> impl Stream<Item = Result<GenerateContentResponse, GenerateError>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    futures::stream::unfold(
        (byte_stream, Vec::<u8>::new(), false),
        |(mut byte_stream, mut buffer, mut finished)| async move {
            loop {
                if let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let rest = buffer.split_off(pos + 1);
                    let line = std::mem::replace(&mut buffer, rest);
                    if let Some(event) = parse_sse_line(&String::from_utf8_lossy(&line)) {
                        return Some((event, (byte_stream, buffer, finished)));
                    }
                    continue;
                }

                if finished {
                    // Last line without a trailing newline
                    let line = std::mem::take(&mut buffer);
                    return parse_sse_line(&String::from_utf8_lossy(&line))
                        .map(|event| (event, (byte_stream, buffer, finished)));
                }

                match byte_stream.next().await {
                    Some(Ok(bytes)) => buffer.extend_from_slice(bytes.as_ref()),
                    Some(Err(e)) => {
                        let error = GenerateError::Stream(e.to_string());
                        return Some((Err(error), (byte_stream, Vec::new(), true)));
                    }
                    None => finished = true,
                }
            }
        },
    )
}
