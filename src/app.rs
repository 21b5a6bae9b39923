use std::path::{Path, PathBuf};

use crate::api::Content;
use crate::ui_state::UiState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// One image plus one prompt per request
    Bake,
    /// Conversation over a seeded history
    Chat,
}

#[derive(Debug)]
pub struct App {
    pub mode: AppMode,
    pub should_quit: bool,
    pub input_buffer: String,
    pub scroll_offset: usize,
    pub show_help: bool,
    pub exit_pending: bool,
    pub stream_responses: bool,
    pub model_name: String,
    pub images: Vec<PathBuf>,
    pub selected_image: usize,
    /// Set when something outside the view-model fails, e.g. reading an image
    pub status_message: Option<String>,

    // Latest snapshot of the active view-model
    pub ui_state: UiState,
    pub chat_history: Vec<Content>,
    /// The active view-model still has a request running
    pub request_running: bool,
    // Whether the last request in each mode was sent as a stream
    bake_streamed: bool,
    chat_streamed: bool,
}

impl App {
    pub fn new(model_name: String, images: Vec<PathBuf>) -> Self {
        Self {
            mode: AppMode::Bake,
            should_quit: false,
            input_buffer: String::new(),
            scroll_offset: 0,
            show_help: false,
            exit_pending: false,
            stream_responses: true,
            model_name,
            images,
            selected_image: 0,
            status_message: None,
            ui_state: UiState::Initial,
            chat_history: Vec::new(),
            request_running: false,
            bake_streamed: false,
            chat_streamed: false,
        }
    }

    pub const fn quit(&mut self) {
        self.should_quit = true;
    }

    pub const fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub const fn toggle_stream(&mut self) {
        self.stream_responses = !self.stream_responses;
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AppMode::Bake => AppMode::Chat,
            AppMode::Chat => AppMode::Bake,
        };
        self.status_message = None;
        self.scroll_to_bottom();
    }

    pub const fn is_loading(&self) -> bool {
        self.ui_state.is_loading()
    }

    /// A request is in flight, even if a stream has already produced text
    pub const fn is_busy(&self) -> bool {
        self.request_running || self.is_loading()
    }

    /// Remember how the request about to be sent in the current mode is delivered
    pub const fn record_request_mode(&mut self) {
        match self.mode {
            AppMode::Bake => self.bake_streamed = self.stream_responses,
            AppMode::Chat => self.chat_streamed = self.stream_responses,
        }
    }

    /// Whether the response shown in the current mode was requested as a stream
    pub const fn response_streamed(&self) -> bool {
        match self.mode {
            AppMode::Bake => self.bake_streamed,
            AppMode::Chat => self.chat_streamed,
        }
    }

    pub fn selected_image(&self) -> Option<&Path> {
        self.images.get(self.selected_image).map(PathBuf::as_path)
    }

    pub fn next_image(&mut self) {
        if !self.images.is_empty() {
            self.selected_image = (self.selected_image + 1) % self.images.len();
        }
    }

    pub fn previous_image(&mut self) {
        if !self.images.is_empty() {
            self.selected_image = self
                .selected_image
                .checked_sub(1)
                .unwrap_or(self.images.len() - 1);
        }
    }

    /// Text of an in-flight or just-finished chat reply not yet in the history
    pub fn pending_reply(&self) -> Option<&str> {
        let text = self.ui_state.text()?;
        let recorded = self
            .chat_history
            .last()
            .and_then(Content::text)
            .is_some_and(|last| last == text);
        (!recorded).then_some(text)
    }

    pub const fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(amount);
    }

    pub const fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub const fn scroll_to_bottom(&mut self) {
        // The rendering code clamps this to the real maximum
        self.scroll_offset = usize::MAX;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with_images(count: usize) -> App {
        let images = (0..count)
            .map(|i| PathBuf::from(format!("/bakes/{i}.png")))
            .collect();
        App::new("gemini-1.5-flash".to_string(), images)
    }

    #[test]
    fn test_app_new() {
        let app = app_with_images(0);
        assert_eq!(app.mode, AppMode::Bake);
        assert!(!app.should_quit);
        assert!(app.stream_responses);
        assert_eq!(app.ui_state, UiState::Initial);
        assert!(app.selected_image().is_none());
    }

    #[test]
    fn test_app_quit() {
        let mut app = app_with_images(0);
        app.quit();
        assert!(app.should_quit);
    }

    #[test]
    fn test_toggle_mode_round_trips() {
        let mut app = app_with_images(0);
        app.status_message = Some("old".to_string());
        app.toggle_mode();
        assert_eq!(app.mode, AppMode::Chat);
        assert!(app.status_message.is_none());
        app.toggle_mode();
        assert_eq!(app.mode, AppMode::Bake);
    }

    #[test]
    fn test_toggle_help_and_stream() {
        let mut app = app_with_images(0);
        app.toggle_help();
        assert!(app.show_help);
        app.toggle_stream();
        assert!(!app.stream_responses);
    }

    #[test]
    fn test_image_selection_wraps() {
        let mut app = app_with_images(3);
        assert_eq!(app.selected_image(), Some(Path::new("/bakes/0.png")));

        app.previous_image();
        assert_eq!(app.selected_image, 2);
        app.next_image();
        assert_eq!(app.selected_image, 0);
        app.next_image();
        assert_eq!(app.selected_image(), Some(Path::new("/bakes/1.png")));
    }

    #[test]
    fn test_image_selection_without_images() {
        let mut app = app_with_images(0);
        app.next_image();
        app.previous_image();
        assert_eq!(app.selected_image, 0);
        assert!(app.selected_image().is_none());
    }

    #[test]
    fn test_is_loading_follows_ui_state() {
        let mut app = app_with_images(0);
        app.ui_state = UiState::Loading;
        assert!(app.is_loading());
        app.ui_state = UiState::Error("failed".to_string());
        assert!(!app.is_loading());
    }

    #[test]
    fn test_busy_while_request_running() {
        let mut app = app_with_images(0);
        assert!(!app.is_busy());

        app.ui_state = UiState::Success("Partial".to_string());
        app.request_running = true;
        assert!(app.is_busy());
        assert!(!app.is_loading());

        app.request_running = false;
        assert!(!app.is_busy());
    }

    #[test]
    fn test_response_streamed_follows_request_not_toggle() {
        let mut app = app_with_images(0);
        app.record_request_mode();
        assert!(app.response_streamed());

        app.toggle_stream();
        assert!(app.response_streamed());

        app.record_request_mode();
        assert!(!app.response_streamed());

        app.toggle_mode();
        assert!(!app.response_streamed());
    }

    #[test]
    fn test_pending_reply_hides_recorded_text() {
        let mut app = app_with_images(0);
        app.ui_state = UiState::Success("Scones".to_string());
        assert_eq!(app.pending_reply(), Some("Scones"));

        app.chat_history.push(Content::user_text("What should I bake?"));
        app.chat_history.push(Content::model_text("Scones"));
        assert_eq!(app.pending_reply(), None);
    }

    #[test]
    fn test_scroll_up() {
        let mut app = app_with_images(0);
        app.scroll_offset = 10;
        app.scroll_up(3);
        assert_eq!(app.scroll_offset, 7);
        app.scroll_up(10);
        assert_eq!(app.scroll_offset, 0);
    }

    #[test]
    fn test_scroll_down_and_bounds() {
        let mut app = app_with_images(0);
        app.scroll_down(3);
        assert_eq!(app.scroll_offset, 3);
        app.scroll_to_bottom();
        assert_eq!(app.scroll_offset, usize::MAX);
        app.scroll_down(1);
        assert_eq!(app.scroll_offset, usize::MAX);
        app.scroll_to_top();
        assert_eq!(app.scroll_offset, 0);
    }
}
