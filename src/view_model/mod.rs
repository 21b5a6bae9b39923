// View-models: turn prompt requests into UI state transitions

pub mod chat;
pub mod scope;

use futures::StreamExt;
use std::sync::Arc;
#[cfg(test)]
use tokio::sync::watch;

use crate::api::{Content, GenerateContentResponse, GenerateError, GenerativeModel};
use crate::images::ImageAttachment;
use crate::ui_state::UiState;
pub use chat::ChatViewModel;
use scope::{StatePublisher, ViewModelScope};

/// Default prompt for an image with no accompanying text
pub const DEFAULT_PROMPT: &str = "Provide a recipe for the baked goods in the image";

/// Run a single-shot request and publish its outcome.
///
/// Returns the text only when the success was actually published.
async fn generate_once<M>(
    model: &M,
    contents: Vec<Content>,
    publisher: &StatePublisher,
) -> Option<String>
where
    M: GenerativeModel + ?Sized,
{
    let result = model
        .generate_content(contents)
        .await
        .and_then(GenerateContentResponse::into_text);

    match result {
        Ok(text) => {
            tracing::info!(chars = text.len(), "generation finished");
            publisher.publish(UiState::Success(text.clone())).then_some(text)
        }
        Err(e) => {
            publish_failure(publisher, &e);
            None
        }
    }
}

/// Consume a streaming request, publishing the running buffer after every increment.
async fn generate_streaming<M>(
    model: &M,
    contents: Vec<Content>,
    publisher: &StatePublisher,
) -> Option<String>
where
    M: GenerativeModel + ?Sized,
{
    let mut stream = model.generate_content_stream(contents);
    let mut buffer = String::new();

    while let Some(item) = stream.next().await {
        let chunk = match item {
            Ok(chunk) => chunk,
            Err(e) => {
                publish_failure(publisher, &e);
                return None;
            }
        };

        match chunk.text() {
            Some(text) if !text.is_empty() => {
                buffer.push_str(&text);
                if !publisher.publish(UiState::Success(buffer.clone())) {
                    tracing::debug!("stream superseded or cancelled");
                    return None;
                }
            }
            _ => {
                if let Some(reason) = chunk.block_reason() {
                    publish_failure(publisher, &GenerateError::Blocked(reason.to_string()));
                    return None;
                }
            }
        }
    }

    if buffer.is_empty() {
        publish_failure(publisher, &GenerateError::EmptyResponse);
        return None;
    }

    tracing::info!(chars = buffer.len(), "streaming generation finished");
    Some(buffer)
}

fn publish_failure(publisher: &StatePublisher, error: &GenerateError) {
    tracing::warn!(error = ?error, "generation failed");
    publisher.publish(UiState::Error(error.to_string()));
}

fn build_prompt(image: Option<&ImageAttachment>, prompt: &str) -> Content {
    let mut builder = Content::builder();
    if let Some(image) = image {
        builder = builder.part(image.to_part());
    }
    builder.text(prompt).build()
}

/// Single image-plus-prompt request per user action.
pub struct BakingViewModel<M> {
    model: Arc<M>,
    scope: ViewModelScope,
}

impl<M> BakingViewModel<M>
where
    M: GenerativeModel + 'static,
{
    pub fn new(model: Arc<M>) -> Self {
        Self {
            model,
            scope: ViewModelScope::new(UiState::Initial),
        }
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.scope.subscribe()
    }

    pub fn state(&self) -> UiState {
        self.scope.current()
    }

    /// Whether a request is still running, including a stream that already shows text
    pub fn is_busy(&self) -> bool {
        self.scope.is_busy()
    }

    pub fn send_prompt(&self, image: Option<&ImageAttachment>, prompt: &str) {
        let contents = vec![build_prompt(image, prompt)];
        tracing::info!(image = image.map(|i| i.name.as_str()), "sending prompt");

        let model = Arc::clone(&self.model);
        self.scope.launch(|publisher| {
            publisher.publish(UiState::Loading);
            async move {
                generate_once(&*model, contents, &publisher).await;
            }
        });
    }

    pub fn send_prompt_stream(&self, image: Option<&ImageAttachment>, prompt: &str) {
        let contents = vec![build_prompt(image, prompt)];
        tracing::info!(image = image.map(|i| i.name.as_str()), "sending streaming prompt");

        let model = Arc::clone(&self.model);
        self.scope.launch(|publisher| {
            publisher.publish(UiState::Loading);
            async move {
                generate_streaming(&*model, contents, &publisher).await;
            }
        });
    }

    /// Cancel in-flight work; no state is published afterwards
    pub fn clear(&self) {
        self.scope.cancel();
    }
}
