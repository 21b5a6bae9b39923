mod api;
mod app;
mod config;
mod images;
mod logging;
mod models;
#[cfg(test)]
mod stream_semantics;
mod ui;
mod ui_state;
mod view_model;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, prelude::*};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use api::{GeminiClient, GenerativeModel};
use app::{App, AppMode};
use images::ImageAttachment;
use view_model::{BakingViewModel, ChatViewModel, DEFAULT_PROMPT};

/// Both screens' view-models; they live as long as the terminal session
struct ViewModels<M> {
    bake: BakingViewModel<M>,
    chat: ChatViewModel<M>,
}

impl<M: GenerativeModel + 'static> ViewModels<M> {
    fn new(model: &Arc<M>) -> Self {
        Self {
            bake: BakingViewModel::new(Arc::clone(model)),
            chat: ChatViewModel::new(Arc::clone(model)),
        }
    }

    fn clear(&self) {
        self.bake.clear();
        self.chat.clear();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();

    let config = config::load_config()?;
    if !config.has_api_key() {
        anyhow::bail!(
            "No API key configured. Set {} or add api_key to {}",
            config::API_KEY_ENV,
            config::get_config_path()?.display()
        );
    }

    let images = match &config.image_dir {
        Some(dir) => images::discover_images(dir)?,
        None => Vec::new(),
    };
    let client = Arc::new(GeminiClient::new(&config)?);
    tracing::info!(model = client.model_name(), images = images.len(), "starting bakery");

    let view_models = ViewModels::new(&client);
    let mut app = App::new(client.model_name().to_string(), images);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &view_models);

    // Abort anything still in flight before tearing down
    view_models.clear();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "terminal loop failed");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// Copy the active view-model's state into the app before drawing
fn sync_state<M: GenerativeModel + 'static>(app: &mut App, view_models: &ViewModels<M>) {
    let (state, running) = match app.mode {
        AppMode::Bake => (view_models.bake.state(), view_models.bake.is_busy()),
        AppMode::Chat => {
            app.chat_history = view_models.chat.history();
            (view_models.chat.state(), view_models.chat.is_busy())
        }
    };
    app.request_running = running;

    if state != app.ui_state {
        app.ui_state = state;
        if let Some(message) = app.ui_state.error() {
            tracing::debug!(error = message, "showing failed request");
        }
        if app.mode == AppMode::Chat || app.ui_state.is_loading() {
            app.scroll_to_bottom();
        }
    }
}

fn submit<M: GenerativeModel + 'static>(app: &mut App, view_models: &ViewModels<M>) {
    let typed = std::mem::take(&mut app.input_buffer);
    let prompt = typed.trim();
    app.status_message = None;

    match app.mode {
        AppMode::Bake => {
            let prompt = if prompt.is_empty() { DEFAULT_PROMPT } else { prompt };
            let image = match app.selected_image().map(ImageAttachment::from_path).transpose() {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(error = ?e, "could not attach image");
                    app.status_message = Some(format!("{e:#}"));
                    app.input_buffer = typed;
                    return;
                }
            };

            app.record_request_mode();
            if app.stream_responses {
                view_models.bake.send_prompt_stream(image.as_ref(), prompt);
            } else {
                view_models.bake.send_prompt(image.as_ref(), prompt);
            }
        }
        AppMode::Chat => {
            if prompt.is_empty() {
                app.input_buffer = typed;
                return;
            }

            app.record_request_mode();
            if app.stream_responses {
                view_models.chat.send_message_stream(prompt);
            } else {
                view_models.chat.send_message(prompt);
            }
        }
    }
}

fn handle_key<M: GenerativeModel + 'static>(
    app: &mut App,
    key: KeyCode,
    modifiers: KeyModifiers,
    view_models: &ViewModels<M>,
) {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);

    match key {
        KeyCode::Char('c') if ctrl => {
            if app.exit_pending {
                app.quit();
            } else {
                app.exit_pending = true;
            }
            return;
        }
        KeyCode::Esc => {
            if app.show_help {
                app.show_help = false;
            } else {
                app.exit_pending = false;
            }
            return;
        }
        _ if app.exit_pending => {
            // Any other key cancels pending exit, then is handled normally
            app.exit_pending = false;
        }
        _ => {}
    }

    if app.show_help {
        if key == KeyCode::Char('h') && ctrl {
            app.toggle_help();
        }
        return;
    }

    match key {
        KeyCode::Char('q') if ctrl => app.quit(),
        KeyCode::Char('h') if ctrl => app.toggle_help(),
        KeyCode::Char('s') if ctrl => app.toggle_stream(),
        KeyCode::Char('t') if ctrl => {
            app.toggle_mode();
            sync_state(app, view_models);
        }
        KeyCode::Left => app.previous_image(),
        KeyCode::Right => app.next_image(),

        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::Home => app.scroll_to_top(),
        KeyCode::End => app.scroll_to_bottom(),

        KeyCode::Backspace => {
            app.input_buffer.pop();
        }
        KeyCode::Enter if !app.is_busy() => submit(app, view_models),
        KeyCode::Char(c) if !ctrl => app.input_buffer.push(c),
        _ => {}
    }
}

fn run_app<B: Backend, M: GenerativeModel + 'static>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    view_models: &ViewModels<M>,
) -> Result<()> {
    loop {
        sync_state(app, view_models);
        terminal.draw(|f| ui::render(f, app))?;

        // ~60fps keeps streamed text smooth
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key.code, key.modifiers, view_models);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
