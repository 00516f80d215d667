//! TUI application state management.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::chat::window::{ChatWindow, Grab};
use crate::chat::ChatPanel;
use crate::client::{ClientError, CorrectResult, RunResult};
use crate::llm::StreamEvent;
use crate::session::{Effect, Feature, Session, Ticket};
use crate::utils::clipboard::Copied;

use super::editor::TextBuffer;

pub const COPIED_MESSAGE: &str = "Corrected code copied to clipboard.";

/// Which pane receives typed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Editor,
    Input,
    Visualizer,
    Chat,
}

/// What the event loop must do after a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Quit,
    Effect(Effect),
    SendChat(String),
    Copy(String),
}

/// Application state for the TUI
#[derive(Debug)]
pub struct App {
    pub session: Session,
    /// Source being edited
    pub editor: TextBuffer,
    /// Program standard input
    pub stdin: TextBuffer,
    pub focus: Focus,
    pub chat: ChatPanel,
    /// Created the first time the chat opens
    pub chat_window: Option<ChatWindow>,
    grab: Option<Grab>,
    pub show_help: bool,
    /// Highlighted row in the history overlay
    pub history_cursor: usize,
    pub status_message: String,
}

impl App {
    pub fn new(session: Session, show_help: bool) -> Self {
        let editor = TextBuffer::from_text(session.code());
        let stdin = TextBuffer::from_text(session.stdin());
        Self {
            session,
            editor,
            stdin,
            focus: Focus::Editor,
            chat: ChatPanel::default(),
            chat_window: None,
            grab: None,
            show_help,
            history_cursor: 0,
            status_message: "F5 run | F6 correct | F1 help".to_string(),
        }
    }

    /// Push editor text into the session after a keystroke.
    fn sync_editor(&mut self) {
        let text = self.editor.text();
        if text != self.session.code() {
            self.session.edit(text);
        }
    }

    /// Pull session text into the editor after the session replaced it.
    fn reload_editor(&mut self) {
        if self.editor.text() != self.session.code() {
            self.editor.set_text(self.session.code());
        }
    }

    fn open_chat(&mut self, screen: Rect) {
        self.chat.visible = true;
        match self.chat_window.as_mut() {
            Some(w) => w.clamp_to(screen),
            None => self.chat_window = Some(ChatWindow::docked(screen)),
        }
        self.focus = Focus::Chat;
    }

    fn close_chat(&mut self) {
        self.chat.visible = false;
        self.grab = None;
        if self.focus == Focus::Chat {
            self.focus = Focus::Editor;
        }
    }

    fn cycle_focus(&mut self) {
        let viz = self.session.visualizer().is_some();
        let chat = self.chat.visible;
        self.focus = match self.focus {
            Focus::Editor => Focus::Input,
            Focus::Input if viz => Focus::Visualizer,
            Focus::Input | Focus::Visualizer if chat => Focus::Chat,
            _ => Focus::Editor,
        };
    }

    fn toggle_feature(&mut self, feature: Feature) {
        match self.session.toggle(feature) {
            Ok(on) => {
                if feature == Feature::Visualizer && !on && self.focus == Focus::Visualizer {
                    self.focus = Focus::Editor;
                }
            }
            Err(e) => tracing::debug!(error = %e, "toggle rejected"),
        }
    }

    /// Handle keyboard events
    pub fn on_key(&mut self, key: KeyEvent, screen: Rect) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => return Action::Quit,
            _ => {}
        }

        // Help closes on any key
        if self.show_help {
            self.show_help = false;
            return Action::None;
        }

        if self.session.prompt().is_some() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    let effect = self.session.confirm_prompt();
                    self.reload_editor();
                    effect.map(Action::Effect).unwrap_or(Action::None)
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.session.cancel_prompt();
                    Action::None
                }
                _ => Action::None,
            };
        }

        if self.session.history().is_visible() {
            let len = self.session.history().len();
            match key.code {
                KeyCode::Up => self.history_cursor = self.history_cursor.saturating_sub(1),
                KeyCode::Down => self.history_cursor = (self.history_cursor + 1).min(len.saturating_sub(1)),
                KeyCode::Enter => {
                    let _ = self.session.select_history(self.history_cursor);
                }
                KeyCode::Esc | KeyCode::F(4) => self.session.history_mut().toggle_visible(),
                KeyCode::Char('l') if ctrl => self.session.request_clear_history(),
                _ => {}
            }
            return Action::None;
        }

        if self.chat.visible && alt {
            if let Some(w) = self.chat_window.as_mut() {
                let (dx, dy) = match key.code {
                    KeyCode::Left => (-2, 0),
                    KeyCode::Right => (2, 0),
                    KeyCode::Up => (0, -1),
                    KeyCode::Down => (0, 1),
                    _ => (0, 0),
                };
                if (dx, dy) != (0, 0) {
                    if shift {
                        w.resize_by(dx, dy, screen);
                    } else {
                        w.move_by(dx, dy, screen);
                    }
                    return Action::None;
                }
            }
        }

        match key.code {
            KeyCode::F(1) => {
                self.show_help = true;
                return Action::None;
            }
            KeyCode::F(5) => return self.run(),
            KeyCode::Char('r') if ctrl => return self.run(),
            KeyCode::F(6) => {
                return self.session.request_correction().map(Action::Effect).unwrap_or(Action::None);
            }
            KeyCode::F(2) => {
                self.toggle_feature(Feature::Visualizer);
                return Action::None;
            }
            KeyCode::F(3) => {
                self.toggle_feature(Feature::Questions);
                return Action::None;
            }
            KeyCode::F(4) => {
                self.session.history_mut().toggle_visible();
                self.history_cursor = 0;
                if !self.session.history().is_visible() {
                    self.status_message = "No history yet.".to_string();
                }
                return Action::None;
            }
            KeyCode::F(7) => {
                if self.chat.visible {
                    self.close_chat();
                } else {
                    self.open_chat(screen);
                }
                return Action::None;
            }
            KeyCode::F(8) => {
                let next = self.session.language().next();
                self.session.set_language(next);
                return Action::None;
            }
            KeyCode::Char('l') if ctrl => {
                self.session.request_clear_history();
                return Action::None;
            }
            KeyCode::Char('y') if ctrl => {
                return self.session.copy_corrected().map_or(Action::None, Action::Copy);
            }
            KeyCode::Tab => {
                self.cycle_focus();
                return Action::None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Editor => {
                if edit_buffer(&mut self.editor, key) {
                    self.sync_editor();
                }
                Action::None
            }
            Focus::Input => {
                if edit_buffer(&mut self.stdin, key) {
                    self.session.set_stdin(self.stdin.text());
                }
                Action::None
            }
            Focus::Visualizer => {
                if let Some(viz) = self.session.visualizer_mut() {
                    match key.code {
                        KeyCode::Left => {
                            viz.pause();
                            viz.step_back();
                        }
                        KeyCode::Right => {
                            viz.pause();
                            viz.step_forward();
                        }
                        KeyCode::Char(' ') => viz.toggle_play(),
                        _ => {}
                    }
                }
                Action::None
            }
            Focus::Chat => match key.code {
                KeyCode::Esc => {
                    self.close_chat();
                    Action::None
                }
                KeyCode::Enter => self.chat.submit().map(Action::SendChat).unwrap_or(Action::None),
                KeyCode::Backspace => {
                    self.chat.input.pop();
                    Action::None
                }
                KeyCode::Char(c) if !ctrl => {
                    self.chat.input.push(c);
                    Action::None
                }
                _ => Action::None,
            },
        }
    }

    fn run(&mut self) -> Action {
        self.session.request_run().map(Action::Effect).unwrap_or(Action::None)
    }

    /// Bracketed paste goes to the focused pane; in the editor it replaces
    /// the whole source.
    pub fn on_paste(&mut self, text: String) {
        match self.focus {
            Focus::Editor => {
                if self.session.paste(text) {
                    self.editor.set_text(self.session.code());
                }
            }
            Focus::Input => {
                self.stdin.insert_str(&text);
                self.session.set_stdin(self.stdin.text());
            }
            Focus::Chat => self.chat.input.push_str(&text.replace(['\r', '\n'], " ")),
            Focus::Visualizer => {}
        }
    }

    pub fn on_copied(&mut self, result: anyhow::Result<Copied>) {
        self.session.clear_notice();
        self.status_message = match result {
            Ok(via) => {
                tracing::debug!(?via, "corrected code copied");
                COPIED_MESSAGE.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "copy failed");
                format!("Copy failed: {e}")
            }
        };
    }

    /// Drag the chat window by its title bar or bottom-right corner.
    pub fn on_mouse(&mut self, ev: MouseEvent, screen: Rect) {
        if !self.chat.visible {
            return;
        }
        let Some(w) = self.chat_window.as_mut() else {
            return;
        };
        match ev.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.grab = w.hit(ev.column, ev.row);
                if self.grab.is_some() || w.contains(ev.column, ev.row) {
                    self.focus = Focus::Chat;
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(grab) = self.grab {
                    w.drag(grab, ev.column, ev.row, screen);
                }
            }
            MouseEventKind::Up(_) => self.grab = None,
            _ => {}
        }
    }

    pub fn on_resize(&mut self, screen: Rect) {
        if let Some(w) = self.chat_window.as_mut() {
            w.clamp_to(screen);
        }
    }

    pub fn on_tick(&mut self) {
        if let Some(viz) = self.session.visualizer_mut() {
            viz.tick();
        }
    }

    pub fn on_run_finished(&mut self, ticket: Ticket, outcome: Result<RunResult, ClientError>) {
        self.session.complete_run(ticket, outcome);
    }

    pub fn on_correction_finished(&mut self, ticket: Ticket, outcome: Result<CorrectResult, ClientError>) {
        self.session.complete_correction(ticket, outcome);
    }

    pub fn on_chat_event(&mut self, ev: StreamEvent) {
        match ev {
            StreamEvent::Content(t) => self.chat.append_reply(&t),
            StreamEvent::Done => self.chat.finish_reply(),
        }
    }

    pub fn on_chat_failed(&mut self, error: &str) {
        tracing::error!(error, "chat request failed");
        self.chat.fail_reply();
    }

    /// Text for the status bar: session notice first, then busy state.
    pub fn status_line(&self) -> String {
        let busy = match self.session.busy_with() {
            Some(crate::session::RequestKind::Run) => " | running...",
            Some(crate::session::RequestKind::Correct) => " | correcting...",
            None => "",
        };
        let message = self.session.notice().unwrap_or(&self.status_message);
        format!("[{}]{} | {}", self.session.language(), busy, message)
    }
}

/// Apply an editing key to `buf`. Returns whether the text changed.
fn edit_buffer(buf: &mut TextBuffer, key: KeyEvent) -> bool {
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return false;
    }
    match key.code {
        KeyCode::Char(c) => buf.insert_char(c),
        KeyCode::Enter => buf.insert_newline(),
        KeyCode::Backspace => buf.backspace(),
        KeyCode::Delete => buf.delete(),
        KeyCode::Left => {
            buf.move_left();
            return false;
        }
        KeyCode::Right => {
            buf.move_right();
            return false;
        }
        KeyCode::Up => {
            buf.move_up();
            return false;
        }
        KeyCode::Down => {
            buf.move_down();
            return false;
        }
        KeyCode::Home => {
            buf.move_home();
            return false;
        }
        KeyCode::End => {
            buf.move_end();
            return false;
        }
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ExecutionStep, RunResult};
    use crate::highlight::Language;
    use crate::history::{EntryStatus, HistoryStore};
    use crate::session::{OutputPane, Prompt};

    const SCREEN: Rect = Rect { x: 0, y: 0, width: 120, height: 40 };

    fn app() -> App {
        App::new(Session::new(HistoryStore::in_memory(50), Language::Python), false)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.on_key(key(KeyCode::Char(c)), SCREEN);
        }
    }

    fn run_ok(app: &mut App, result: RunResult) {
        let Action::Effect(Effect::Run(ticket, _)) = app.on_key(key(KeyCode::F(5)), SCREEN) else {
            panic!("expected a run effect");
        };
        app.on_run_finished(ticket, Ok(result));
    }

    #[test]
    fn typing_reaches_the_session() {
        let mut app = app();
        type_text(&mut app, "print(1)");
        assert_eq!(app.session.code(), "print(1)");
    }

    #[test]
    fn run_sends_current_code_and_stdin() {
        let mut app = app();
        type_text(&mut app, "x = input()");
        app.on_key(key(KeyCode::Tab), SCREEN);
        assert_eq!(app.focus, Focus::Input);
        type_text(&mut app, "42");
        match app.on_key(ctrl('r'), SCREEN) {
            Action::Effect(Effect::Run(_, req)) => {
                assert_eq!(req.code, "x = input()");
                assert_eq!(req.user_input, "42");
                assert_eq!(req.language, "python");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(app.on_key(key(KeyCode::F(5)), SCREEN), Action::None);
    }

    #[test]
    fn visualizer_keys_step_and_play() {
        let mut app = app();
        type_text(&mut app, "a");
        let steps = vec![
            ExecutionStep { line_number: 0, step_description: "one".into() },
            ExecutionStep { line_number: 0, step_description: "two".into() },
        ];
        run_ok(&mut app, RunResult { execution_steps: Some(steps), ..RunResult::output("ok") });
        app.on_key(key(KeyCode::F(2)), SCREEN);
        assert!(app.session.visualizer().is_some());

        app.focus = Focus::Input;
        app.on_key(key(KeyCode::Tab), SCREEN);
        assert_eq!(app.focus, Focus::Visualizer);
        app.on_key(key(KeyCode::Right), SCREEN);
        assert_eq!(app.session.visualizer().unwrap().description(), "two");
        app.on_key(key(KeyCode::Left), SCREEN);
        app.on_key(key(KeyCode::Char(' ')), SCREEN);
        app.on_tick();
        assert_eq!(app.session.visualizer().unwrap().index(), 1);
        assert!(!app.session.visualizer().unwrap().is_playing());
    }

    #[test]
    fn gated_toggle_shows_notice() {
        let mut app = app();
        app.on_key(key(KeyCode::F(3)), SCREEN);
        assert!(!app.session.toggles().questions);
        assert!(app.status_line().contains("Please run your code successfully"));
    }

    #[test]
    fn error_prompt_offers_correction() {
        let mut app = app();
        type_text(&mut app, "prnt(1)");
        run_ok(&mut app, RunResult::error("NameError"));
        assert_eq!(app.session.prompt(), Some(Prompt::OfferCorrection));
        // typing is swallowed by the prompt
        app.on_key(key(KeyCode::Char('x')), SCREEN);
        assert_eq!(app.session.code(), "prnt(1)");
        let action = app.on_key(key(KeyCode::Char('y')), SCREEN);
        assert!(matches!(action, Action::Effect(Effect::Correct(..))));
    }

    #[test]
    fn paste_replaces_editor_and_records() {
        let mut app = app();
        type_text(&mut app, "old");
        app.on_paste("new = 1\rprint(new)".into());
        assert_eq!(app.editor.lines(), ["new = 1", "print(new)"]);
        assert_eq!(app.editor.text(), "new = 1\nprint(new)");
        assert_eq!(app.session.code(), "new = 1\nprint(new)");
        assert_eq!(app.session.history().entries()[0].status, EntryStatus::Pasted);
    }

    #[test]
    fn history_overlay_loads_entry() {
        let mut app = app();
        type_text(&mut app, "first");
        run_ok(&mut app, RunResult::output("1"));
        app.on_key(key(KeyCode::Char('!')), SCREEN);
        assert_eq!(app.session.code(), "first!");

        app.on_key(key(KeyCode::F(4)), SCREEN);
        assert!(app.session.history().is_visible());
        app.on_key(key(KeyCode::Enter), SCREEN);
        assert!(matches!(app.session.prompt(), Some(Prompt::LoadHistory(0))));
        app.on_key(key(KeyCode::Enter), SCREEN);
        assert_eq!(app.editor.text(), "first");
        assert_eq!(app.session.code(), "first");
        assert!(!app.session.history().is_visible());
    }

    #[test]
    fn empty_history_does_not_open() {
        let mut app = app();
        app.on_key(key(KeyCode::F(4)), SCREEN);
        assert!(!app.session.history().is_visible());
        assert_eq!(app.status_message, "No history yet.");
    }

    #[test]
    fn help_swallows_next_key() {
        let mut app = App::new(Session::new(HistoryStore::in_memory(5), Language::Python), true);
        app.on_key(key(KeyCode::F(5)), SCREEN);
        assert!(!app.show_help);
        assert_eq!(*app.session.output(), OutputPane::Placeholder);
    }

    #[test]
    fn chat_window_opens_moves_and_sends() {
        let mut app = app();
        app.on_key(key(KeyCode::F(7)), SCREEN);
        assert!(app.chat.visible);
        assert_eq!(app.focus, Focus::Chat);
        let before = app.chat_window.unwrap();
        app.on_key(KeyEvent::new(KeyCode::Left, KeyModifiers::ALT), SCREEN);
        assert_eq!(app.chat_window.unwrap().x, before.x - 2);
        app.on_key(KeyEvent::new(KeyCode::Up, KeyModifiers::ALT | KeyModifiers::SHIFT), SCREEN);
        assert_eq!(app.chat_window.unwrap().height, before.height - 1);

        type_text(&mut app, "hi");
        assert_eq!(app.on_key(key(KeyCode::Enter), SCREEN), Action::SendChat("hi".into()));
        app.on_chat_event(StreamEvent::Content("hello".into()));
        app.on_chat_event(StreamEvent::Done);
        assert_eq!(app.chat.messages.len(), 2);

        app.on_key(key(KeyCode::Esc), SCREEN);
        assert!(!app.chat.visible);
        assert_eq!(app.focus, Focus::Editor);
    }

    #[test]
    fn mouse_drags_chat_title() {
        let mut app = app();
        app.on_key(key(KeyCode::F(7)), SCREEN);
        let w = app.chat_window.unwrap();
        let press = |kind, column, row| MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE };
        app.on_mouse(press(MouseEventKind::Down(MouseButton::Left), w.x + 3, w.y), SCREEN);
        app.on_mouse(press(MouseEventKind::Drag(MouseButton::Left), w.x - 7, w.y - 5), SCREEN);
        app.on_mouse(press(MouseEventKind::Up(MouseButton::Left), w.x - 7, w.y - 5), SCREEN);
        let moved = app.chat_window.unwrap();
        assert_eq!((moved.x, moved.y), (w.x - 10, w.y - 5));
    }

    #[test]
    fn copy_corrected_leaves_editor_alone() {
        let mut app = app();
        type_text(&mut app, "prnt(1)");
        let Action::Effect(Effect::Correct(ticket, _)) = app.on_key(key(KeyCode::F(6)), SCREEN) else {
            panic!("expected a correction effect");
        };
        app.on_correction_finished(
            ticket,
            Ok(CorrectResult { corrected_code: Some("print(1)".into()), explanation: None, error: None }),
        );
        assert_eq!(app.on_key(ctrl('y'), SCREEN), Action::Copy("print(1)".into()));
        assert_eq!(app.editor.text(), "prnt(1)");
        assert_eq!(app.session.code(), "prnt(1)");
        assert_eq!(app.session.history().entries()[0].status, EntryStatus::Copied);

        app.on_copied(Ok(Copied::Osc52));
        assert!(app.status_line().ends_with(COPIED_MESSAGE));
        app.on_copied(Err(anyhow::anyhow!("no display")));
        assert!(app.status_line().contains("Copy failed"));
    }
}
