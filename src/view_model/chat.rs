// Multi-turn conversation seeded with a fixed history

use std::sync::{Arc, Mutex, PoisonError};
#[cfg(test)]
use tokio::sync::watch;

use super::scope::ViewModelScope;
use super::{generate_once, generate_streaming};
use crate::api::{Content, GenerativeModel};
use crate::ui_state::UiState;

/// Conversation context every chat starts from
pub fn seed_history() -> Vec<Content> {
    vec![
        Content::user_text("Hi! I'd like some help deciding what to bake this weekend."),
        Content::model_text(
            "Happy to help! Tell me what ingredients you have and how much time you can spend.",
        ),
        Content::user_text("I have flour, butter, eggs, sugar and about two hours."),
        Content::model_text(
            "That's plenty for shortbread, a pound cake or a batch of sugar cookies. \
             Ask me for any of those recipes.",
        ),
    ]
}

type History = Arc<Mutex<Vec<Content>>>;

fn record_turn(history: &History, user: Content, reply: String) {
    let mut history = history.lock().unwrap_or_else(PoisonError::into_inner);
    history.push(user);
    history.push(Content::model_text(reply));
}

pub struct ChatViewModel<M> {
    model: Arc<M>,
    history: History,
    scope: ViewModelScope,
}

impl<M> ChatViewModel<M>
where
    M: GenerativeModel + 'static,
{
    pub fn new(model: Arc<M>) -> Self {
        Self::with_history(model, seed_history())
    }

    pub fn with_history(model: Arc<M>, history: Vec<Content>) -> Self {
        Self {
            model,
            history: Arc::new(Mutex::new(history)),
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

    pub fn is_busy(&self) -> bool {
        self.scope.is_busy()
    }

    pub fn history(&self) -> Vec<Content> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// History plus the new user turn, as sent to the model
    fn request(&self, prompt: &str) -> (Content, Vec<Content>) {
        let user = Content::user_text(prompt);
        let mut contents = self.history();
        contents.push(user.clone());
        (user, contents)
    }

    pub fn send_message(&self, prompt: &str) {
        let (user, contents) = self.request(prompt);
        tracing::info!(turns = contents.len(), "sending chat message");

        let model = Arc::clone(&self.model);
        let history = Arc::clone(&self.history);
        self.scope.launch(|publisher| {
            publisher.publish(UiState::Loading);
            async move {
                if let Some(reply) = generate_once(&*model, contents, &publisher).await {
                    record_turn(&history, user, reply);
                }
            }
        });
    }

    pub fn send_message_stream(&self, prompt: &str) {
        let (user, contents) = self.request(prompt);
        tracing::info!(turns = contents.len(), "sending streaming chat message");

        let model = Arc::clone(&self.model);
        let history = Arc::clone(&self.history);
        self.scope.launch(|publisher| {
            publisher.publish(UiState::Loading);
            async move {
                if let Some(reply) = generate_streaming(&*model, contents, &publisher).await {
                    record_turn(&history, user, reply);
                }
            }
        });
    }

    pub fn clear(&self) {
        self.scope.cancel();
    }
}
