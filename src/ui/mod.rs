pub mod markdown;
pub mod widgets;

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

pub fn render(frame: &mut Frame, app: &mut App) {
    // Input grows with its text, up to half the screen
    let available_width = (frame.area().width.saturating_sub(2) as usize).max(1);
    let input_lines = app.input_buffer.chars().count().div_ceil(available_width);
    let max_lines = (frame.area().height as usize / 2).saturating_sub(2).max(1);
    let actual_lines = input_lines.clamp(1, max_lines);

    #[allow(clippy::cast_possible_truncation)]
    let input_height = (actual_lines + 2) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),               // Response
            Constraint::Length(1),            // Gap
            Constraint::Length(1),            // Selected image
            Constraint::Length(1),            // Status line
            Constraint::Length(input_height), // Input field
            Constraint::Length(1),            // Keymap bar
        ])
        .split(frame.area());

    widgets::render_response(frame, app, chunks[0]);
    widgets::render_image_bar(frame, app, chunks[2]);
    widgets::render_status_bar(frame, app, chunks[3]);
    widgets::render_input_field(frame, app, chunks[4]);
    widgets::render_bottom_bar(frame, app, chunks[5]);

    if app.show_help {
        widgets::render_help_window(frame, frame.area());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppMode;
    use crate::ui_state::UiState;
    use ratatui::{backend::TestBackend, Terminal};
    use std::path::PathBuf;

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_initial_screen_shows_welcome_and_image() {
        let mut app = App::new(
            "gemini-1.5-flash".to_string(),
            vec![PathBuf::from("/bakes/croissant.jpg")],
        );
        let screen = draw(&mut app);
        assert!(screen.contains("Welcome to Bakery"));
        assert!(screen.contains("croissant.jpg"));
        assert!(screen.contains("gemini-1.5-flash"));
    }

    #[test]
    fn test_loading_and_error_are_rendered() {
        let mut app = App::new("m".to_string(), Vec::new());
        app.ui_state = UiState::Loading;
        assert!(draw(&mut app).contains("Generating..."));

        app.ui_state = UiState::Error("Prompt was blocked: SAFETY".to_string());
        let screen = draw(&mut app);
        assert!(screen.contains("Error: Prompt was blocked: SAFETY"));
        assert!(screen.contains("[Failed]"));
    }

    #[test]
    fn test_status_label_tracks_how_response_arrived() {
        let mut app = App::new("m".to_string(), Vec::new());
        app.ui_state = UiState::Success("Half a rec".to_string());
        app.record_request_mode();
        app.request_running = true;
        assert!(draw(&mut app).contains("[Streaming...]"));

        app.request_running = false;
        assert!(draw(&mut app).contains("[Streamed]"));

        // Flipping the toggle afterwards does not relabel the shown response
        app.toggle_stream();
        assert!(draw(&mut app).contains("[Streamed]"));

        app.record_request_mode();
        assert!(draw(&mut app).contains("[Done]"));
    }

    #[test]
    fn test_help_overlay() {
        let mut app = App::new("m".to_string(), Vec::new());
        app.show_help = true;
        assert!(draw(&mut app).contains("Keyboard Shortcuts"));
    }

    #[test]
    fn test_long_response_scroll_is_clamped() {
        let mut app = App::new("m".to_string(), Vec::new());
        app.mode = AppMode::Bake;
        app.ui_state = UiState::Success("line\n".repeat(100));
        app.scroll_to_bottom();
        draw(&mut app);
        assert!(app.scroll_offset < 100);
        assert!(app.scroll_offset > 0);
    }
}
