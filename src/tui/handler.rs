//! Async event loop for the interactive debugger.

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event, KeyEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use futures_util::StreamExt;
use ratatui::prelude::*;
use tokio::sync::mpsc;

use super::{
    app::{Action, App},
    events::TuiEvent,
    ui::render_ui,
};
use crate::{
    chat::SYSTEM_PROMPT,
    client::DebugClient,
    config::Config,
    highlight::Language,
    llm::{ChatMessage, ChatOptions, LlmClient, Role},
    session::Effect,
    store::LocalStore,
    utils::clipboard,
};

/// Run the interactive debugger with `code` preloaded.
pub async fn run_tui(cfg: Config, code: Option<String>, language: Language) -> Result<()> {
    let client = DebugClient::from_config(&cfg)?;
    let llm = LlmClient::from_config(&cfg)?;
    let store = LocalStore::from_config(&cfg);
    let first_launch = store.first_launch();

    let mut session = crate::handlers::open_session(&cfg, language);
    if let Some(code) = code {
        session.edit(code);
    }
    let mut app = App::new(session, first_launch);
    tracing::info!(url = client.base_url(), %language, "starting interactive session");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;
    stdout.execute(EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (event_tx, event_rx) = mpsc::unbounded_channel::<TuiEvent>();

    // Main event loop
    let result = run_app(&mut terminal, &mut app, &cfg, client, llm, event_tx, event_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    terminal.backend_mut().execute(DisableBracketedPaste)?;
    terminal.backend_mut().execute(DisableMouseCapture)?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    cfg: &Config,
    client: DebugClient,
    llm: LlmClient,
    event_tx: mpsc::UnboundedSender<TuiEvent>,
    mut event_rx: mpsc::UnboundedReceiver<TuiEvent>,
) -> Result<()> {
    // Spawn input handler; it stops once the receiver is gone
    let input_tx = event_tx.clone();
    tokio::task::spawn_blocking(move || {
        while !input_tx.is_closed() {
            if !event::poll(Duration::from_millis(100)).unwrap_or(false) {
                continue;
            }
            let ev = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => TuiEvent::Key(key),
                Ok(Event::Mouse(mouse)) => TuiEvent::Mouse(mouse),
                Ok(Event::Paste(text)) => TuiEvent::Paste(text),
                Ok(Event::Resize(w, h)) => TuiEvent::Resize(w, h),
                _ => continue,
            };
            if input_tx.send(ev).is_err() {
                break;
            }
        }
    });

    // Visualizer playback clock
    let tick_tx = event_tx.clone();
    let interval = cfg.playback_interval();
    let ticker = tokio::spawn(async move {
        let mut clock = tokio::time::interval(interval);
        loop {
            clock.tick().await;
            if tick_tx.send(TuiEvent::Tick).is_err() {
                break;
            }
        }
    });

    let chat_opts = ChatOptions::from_config(cfg);

    'outer: loop {
        // Render UI
        terminal.draw(|frame| render_ui(frame, app))?;
        let screen = {
            let size = terminal.size()?;
            Rect::new(0, 0, size.width, size.height)
        };

        // Handle every queued event before drawing again
        while let Ok(tui_event) = event_rx.try_recv() {
            match tui_event {
                TuiEvent::Key(key) => match app.on_key(key, screen) {
                    Action::Quit => break 'outer,
                    Action::Effect(effect) => spawn_effect(effect, &client, event_tx.clone()),
                    Action::SendChat(prompt) => spawn_chat(prompt, &llm, chat_opts.clone(), event_tx.clone()),
                    Action::Copy(text) => app.on_copied(clipboard::copy(&text)),
                    Action::None => {}
                },
                TuiEvent::Mouse(mouse) => app.on_mouse(mouse, screen),
                TuiEvent::Paste(text) => app.on_paste(text),
                TuiEvent::Resize(w, h) => app.on_resize(Rect::new(0, 0, w, h)),
                TuiEvent::RunFinished { ticket, outcome } => app.on_run_finished(ticket, outcome),
                TuiEvent::CorrectionFinished { ticket, outcome } => app.on_correction_finished(ticket, outcome),
                TuiEvent::Chat(ev) => app.on_chat_event(ev),
                TuiEvent::ChatFailed(error) => app.on_chat_failed(&error),
                TuiEvent::Tick => app.on_tick(),
            }
        }

        // Small delay to prevent busy waiting
        tokio::time::sleep(Duration::from_millis(16)).await; // ~60 FPS
    }

    ticker.abort();
    Ok(())
}

/// Execute a session effect in the background and report back on the channel.
fn spawn_effect(effect: Effect, client: &DebugClient, tx: mpsc::UnboundedSender<TuiEvent>) {
    let client = client.clone();
    match effect {
        Effect::Run(ticket, req) => {
            tokio::spawn(async move {
                let outcome = client.run(&req).await;
                let _ = tx.send(TuiEvent::RunFinished { ticket, outcome });
            });
        }
        Effect::Correct(ticket, req) => {
            tokio::spawn(async move {
                let outcome = client.correct(&req).await;
                let _ = tx.send(TuiEvent::CorrectionFinished { ticket, outcome });
            });
        }
    }
}

/// Stream one assistant reply into the channel.
fn spawn_chat(prompt: String, llm: &LlmClient, opts: ChatOptions, tx: mpsc::UnboundedSender<TuiEvent>) {
    let messages = vec![ChatMessage::new(Role::System, SYSTEM_PROMPT), ChatMessage::new(Role::User, prompt)];
    let mut stream = llm.chat_stream(messages, opts);
    tokio::spawn(async move {
        while let Some(event_result) = stream.next().await {
            match event_result {
                Ok(stream_event) => {
                    if tx.send(TuiEvent::Chat(stream_event)).is_err() {
                        break; // Channel closed
                    }
                }
                Err(e) => {
                    let _ = tx.send(TuiEvent::ChatFailed(e.to_string()));
                    return;
                }
            }
        }
    });
}
