//! Custom event types for the TUI application.

use crossterm::event::{KeyEvent, MouseEvent};

use crate::client::{ClientError, CorrectResult, RunResult};
use crate::llm::StreamEvent;
use crate::session::Ticket;

/// Events that can occur in the TUI application
#[derive(Debug)]
pub enum TuiEvent {
    /// User keyboard input
    Key(KeyEvent),
    /// Mouse press, drag and release (chat window)
    Mouse(MouseEvent),
    /// Bracketed paste content
    Paste(String),
    /// Terminal resized
    Resize(u16, u16),
    /// A run request finished
    RunFinished { ticket: Ticket, outcome: Result<RunResult, ClientError> },
    /// An auto-correct request finished
    CorrectionFinished { ticket: Ticket, outcome: Result<CorrectResult, ClientError> },
    /// Assistant streaming response event
    Chat(StreamEvent),
    /// The assistant request failed
    ChatFailed(String),
    /// Visualizer playback tick
    Tick,
}
