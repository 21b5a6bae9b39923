use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::api::Role;
use crate::app::{App, AppMode};
use crate::ui_state::UiState;
use crate::view_model::DEFAULT_PROMPT;

pub fn render_help_window(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(Span::styled(
            "Bakery - Keyboard Shortcuts",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("General:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Ctrl+H        - Show/hide this help"),
        Line::from("  Ctrl+Q        - Quit application"),
        Line::from("  Ctrl+C        - Quit (press twice)"),
        Line::from(""),
        Line::from(Span::styled("Prompting:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Enter         - Send prompt"),
        Line::from("  Left/Right    - Choose image"),
        Line::from("  Ctrl+S        - Toggle streaming"),
        Line::from("  Ctrl+T        - Switch Bake/Chat"),
        Line::from(""),
        Line::from(Span::styled("Navigation:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Up/Down       - Scroll response"),
        Line::from("  PgUp/PgDn     - Scroll response"),
        Line::from("  Home/End      - Jump to start/end"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Ctrl+H or Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    let popup_area = centered(area, 50, 22);
    frame.render_widget(Clear, popup_area);
    frame.render_widget(help_paragraph, popup_area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.width.saturating_sub(width) / 2;
    let y = area.height.saturating_sub(height) / 2;
    Rect {
        x: area.x + x,
        y: area.y + y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

pub fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.exit_pending {
        (
            "Press Ctrl+C again to exit, Esc to cancel",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            "Ctrl+C: Quit | Ctrl+H: Help | Ctrl+S: Stream | Ctrl+T: Mode | ←/→: Image",
            Style::default().fg(Color::DarkGray),
        )
    };

    let bar = Paragraph::new(text).alignment(Alignment::Center).style(style);

    frame.render_widget(bar, area);
}

pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (indicator, color) = match &app.ui_state {
        UiState::Initial => ("", Color::Green),
        UiState::Loading => (" [Generating...]", Color::Yellow),
        UiState::Success(_) if app.request_running => (" [Streaming...]", Color::Yellow),
        UiState::Success(_) if app.response_streamed() => (" [Streamed]", Color::Green),
        UiState::Success(_) => (" [Done]", Color::Green),
        UiState::Error(_) => (" [Failed]", Color::Red),
    };

    let mode = match app.mode {
        AppMode::Bake => "bake",
        AppMode::Chat => "chat",
    };
    let stream = if app.stream_responses { "stream" } else { "single" };

    let status_text = format!("{} | {mode} | {stream}{indicator}", app.model_name);

    let status = Paragraph::new(status_text)
        .alignment(Alignment::Right)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD));

    frame.render_widget(status, area);
}

pub fn render_image_bar(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.mode == AppMode::Chat {
        Line::from(Span::styled(
            "Chat mode: images are not attached",
            Style::default().fg(Color::DarkGray),
        ))
    } else if let Some(path) = app.selected_image() {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Line::from(vec![
            Span::raw("Image: "),
            Span::styled(name, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::styled(
                format!(" ({}/{})", app.selected_image + 1, app.images.len()),
                Style::default().fg(Color::DarkGray),
            ),
        ])
    } else {
        Line::from(Span::styled(
            "No images found - prompts are sent as text only",
            Style::default().fg(Color::DarkGray),
        ))
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn state_lines(state: &UiState, lines: &mut Vec<Line<'static>>) {
    match state {
        UiState::Initial => {}
        UiState::Loading => lines.push(Line::from(Span::styled(
            "Generating...",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))),
        UiState::Success(text) => lines.extend(super::markdown::render_markdown(text)),
        UiState::Error(message) => lines.push(Line::from(Span::styled(
            format!("Error: {message}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))),
    }
}

fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for turn in &app.chat_history {
        let (label, color) = match turn.role {
            Some(Role::Model) => ("Model", Color::Green),
            _ => ("You", Color::Cyan),
        };
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("## {label}"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.extend(super::markdown::render_markdown(
            &turn.text().unwrap_or_default(),
        ));
    }

    match &app.ui_state {
        UiState::Success(_) => {
            if let Some(reply) = app.pending_reply() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "## Model",
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )));
                lines.extend(super::markdown::render_markdown(reply));
            }
        }
        state => {
            lines.push(Line::from(""));
            state_lines(state, &mut lines);
        }
    }

    lines
}

fn render_welcome(frame: &mut Frame, app: &App, area: Rect) {
    let hint = match app.mode {
        AppMode::Bake => "Pick an image, type a prompt and press Enter",
        AppMode::Chat => "Ask a follow-up question and press Enter",
    };
    let welcome_text = vec![
        Line::from(Span::styled(
            "Welcome to Bakery",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(hint, Style::default().fg(Color::Cyan))),
    ];

    let welcome_height = 2;
    let welcome_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(welcome_height),
        width: area.width,
        height: welcome_height.min(area.height),
    };

    frame.render_widget(
        Paragraph::new(welcome_text).alignment(Alignment::Center),
        welcome_area,
    );
}

pub fn render_response(frame: &mut Frame, app: &mut App, area: Rect) {
    let mut lines = match app.mode {
        AppMode::Chat => chat_lines(app),
        AppMode::Bake => {
            if app.ui_state == UiState::Initial {
                render_welcome(frame, app, area);
                return;
            }
            let mut lines = Vec::new();
            state_lines(&app.ui_state, &mut lines);
            lines
        }
    };

    if let Some(message) = &app.status_message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    // Wrapped height decides how far we can scroll
    let available_width = (area.width as usize).max(1);
    let total_visual_lines: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(available_width).max(1))
        .sum();

    let max_scroll = total_visual_lines.saturating_sub(area.height as usize);
    let actual_scroll = app.scroll_offset.min(max_scroll);
    app.scroll_offset = actual_scroll;

    let response = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(actual_scroll).unwrap_or(u16::MAX), 0));

    frame.render_widget(response, area);
}

pub fn render_input_field(frame: &mut Frame, app: &App, area: Rect) {
    let placeholder = match app.mode {
        AppMode::Bake => DEFAULT_PROMPT,
        AppMode::Chat => "Type your message...",
    };
    let (input_text, input_style) = if app.input_buffer.is_empty() {
        (placeholder, Style::default().fg(Color::Gray))
    } else {
        (
            app.input_buffer.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    };

    let border_color = if app.is_busy() {
        Color::DarkGray
    } else {
        Color::Cyan
    };

    let input = Paragraph::new(input_text)
        .style(input_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(input, area);
}
