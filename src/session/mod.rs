//! Application state for one debugging session.
//!
//! `Session` owns the editor text, the last run's status and result, the
//! feature toggles, pending confirmation prompts and the history store. It
//! performs no I/O: operations that need the network hand back an [`Effect`]
//! carrying a [`Ticket`], and the caller reports the outcome through
//! [`Session::complete_run`] / [`Session::complete_correction`].
//!
//! Every change to the editor text bumps a generation counter. A completion
//! whose ticket was issued at an older generation is still written to history
//! but leaves status, result and panes alone.

use std::fmt;

use crate::client::{ClientError, CorrectRequest, CorrectResult, RunRequest, RunResult};
use crate::highlight::Language;
use crate::history::{EntrySource, EntryStatus, HistoryEntry, HistoryError, HistoryStore};
use crate::utils::unicode::normalize_newlines;
use crate::visualizer::StepVisualizer;

pub const RUN_FAILED_MESSAGE: &str = "Failed to run code. Please try again. Server might be offline.";
pub const CORRECT_FAILED_MESSAGE: &str = "Failed to auto-correct code. Please try again.";
pub const NO_CORRECTION_MESSAGE: &str = "No correction available.";
pub const STALE_RESULT_MESSAGE: &str = "The code changed while the request was running; its result was discarded.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Visualizer,
    Questions,
}

impl Feature {
    fn label(&self) -> &'static str {
        match self {
            Feature::Visualizer => "visualization",
            Feature::Questions => "questions",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toggles {
    pub visualizer: bool,
    pub questions: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Run,
    Correct,
}

/// Identifies one outstanding request and the code generation it ran on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub kind: RequestKind,
    pub generation: u64,
}

/// Side effects the caller must execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Run(Ticket, RunRequest),
    Correct(Ticket, CorrectRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPane {
    Placeholder,
    Running,
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectionPane {
    Empty,
    Pending,
    Corrected { code: String, explanation: Option<String> },
    Failed(String),
}

/// Confirmation prompts awaiting a yes/no.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    OfferCorrection,
    LoadHistory(usize),
    ClearHistory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionsView<'a> {
    Placeholder(&'static str),
    List(Vec<&'a str>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    NotRunSuccessfully(Feature),
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateError::NotRunSuccessfully(feature) => {
                write!(f, "Please run your code successfully before enabling {}.", feature.label())
            }
        }
    }
}

impl std::error::Error for GateError {}

#[derive(Debug, Clone)]
struct InFlight {
    ticket: Ticket,
    code: String,
    language: Language,
}

#[derive(Debug)]
pub struct Session {
    code: String,
    language: Language,
    stdin: String,
    status: Option<RunStatus>,
    last_result: Option<RunResult>,
    toggles: Toggles,
    generation: u64,
    in_flight: Option<InFlight>,
    output: OutputPane,
    correction: CorrectionPane,
    prompt: Option<Prompt>,
    notice: Option<String>,
    visualizer: Option<StepVisualizer>,
    history: HistoryStore,
}

impl Session {
    pub fn new(history: HistoryStore, language: Language) -> Self {
        Self {
            code: String::new(),
            language,
            stdin: String::new(),
            status: None,
            last_result: None,
            toggles: Toggles::default(),
            generation: 0,
            in_flight: None,
            output: OutputPane::Placeholder,
            correction: CorrectionPane::Empty,
            prompt: None,
            notice: None,
            visualizer: None,
            history,
        }
    }

    // ----- accessors -----

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn stdin(&self) -> &str {
        &self.stdin
    }

    pub fn status(&self) -> Option<RunStatus> {
        self.status
    }

    pub fn last_result(&self) -> Option<&RunResult> {
        self.last_result.as_ref()
    }

    pub fn toggles(&self) -> Toggles {
        self.toggles
    }

    /// Toggles can only be switched after a successful run.
    pub fn toggles_enabled(&self) -> bool {
        self.status == Some(RunStatus::Success) && self.last_result.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn busy_with(&self) -> Option<RequestKind> {
        self.in_flight.as_ref().map(|f| f.ticket.kind)
    }

    pub fn output(&self) -> &OutputPane {
        &self.output
    }

    pub fn correction(&self) -> &CorrectionPane {
        &self.correction
    }

    pub fn prompt(&self) -> Option<Prompt> {
        self.prompt
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub fn visualizer(&self) -> Option<&StepVisualizer> {
        self.visualizer.as_ref()
    }

    pub fn visualizer_mut(&mut self) -> Option<&mut StepVisualizer> {
        self.visualizer.as_mut()
    }

    /// Placeholder for the visualizer pane, or `None` when the replay is shown.
    pub fn visualizer_placeholder(&self) -> Option<&'static str> {
        if !self.toggles_enabled() {
            Some("Run code successfully to enable visualization")
        } else if !self.toggles.visualizer {
            Some("Enable visualization to see code execution")
        } else if self.visualizer.is_none() {
            Some("No visualization data available for this code.")
        } else {
            None
        }
    }

    pub fn questions_view(&self) -> QuestionsView<'_> {
        if !self.toggles_enabled() {
            return QuestionsView::Placeholder("Run code successfully to enable questions");
        }
        if !self.toggles.questions {
            return QuestionsView::Placeholder("Enable questions to see learning prompts here");
        }
        let list = self.last_result.as_ref().map(RunResult::question_list).unwrap_or_default();
        if list.is_empty() {
            QuestionsView::Placeholder("No learning questions available for this code.")
        } else {
            QuestionsView::List(list)
        }
    }

    // ----- editor -----

    /// Replace the editor text. Invalidates a successful run.
    pub fn edit(&mut self, code: impl Into<String>) {
        let code = code.into();
        if code == self.code {
            return;
        }
        self.code = code;
        self.generation += 1;
        self.notice = None;
        if self.status == Some(RunStatus::Success) {
            tracing::debug!(generation = self.generation, "edit invalidated last run");
            self.invalidate_run();
        }
    }

    /// Replace the editor text with pasted content and record it. Resets the
    /// run status whatever it was.
    pub fn paste(&mut self, text: impl Into<String>) -> bool {
        let text = normalize_newlines(&text.into());
        if text.trim().is_empty() {
            self.notice = Some("Nothing to paste.".into());
            return false;
        }
        self.history.record(HistoryEntry::new(text.clone(), EntryStatus::Pasted, EntrySource::Paste));
        self.code = text;
        self.generation += 1;
        self.notice = None;
        self.invalidate_run();
        true
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn set_stdin(&mut self, stdin: impl Into<String>) {
        self.stdin = stdin.into();
    }

    fn invalidate_run(&mut self) {
        self.status = None;
        self.last_result = None;
        self.toggles = Toggles::default();
        self.visualizer = None;
    }

    fn fail_run(&mut self) {
        self.status = Some(RunStatus::Error);
        self.last_result = None;
        self.toggles = Toggles::default();
        self.visualizer = None;
    }

    // ----- remote actions -----

    fn begin(&mut self, kind: RequestKind) -> Option<Ticket> {
        if let Some(current) = &self.in_flight {
            tracing::warn!(?kind, busy = ?current.ticket.kind, "request ignored, another one is in flight");
            return None;
        }
        let ticket = Ticket { kind, generation: self.generation };
        self.in_flight = Some(InFlight { ticket, code: self.code.clone(), language: self.language });
        Some(ticket)
    }

    /// Take the in-flight slot for `ticket`; `None` if it does not match.
    fn finish(&mut self, ticket: Ticket) -> Option<InFlight> {
        match self.in_flight.take() {
            Some(f) if f.ticket == ticket => Some(f),
            other => {
                tracing::warn!(?ticket, "completion for an unknown request");
                self.in_flight = other;
                None
            }
        }
    }

    /// Start a run of the current code. Ignored while a request is in flight.
    pub fn request_run(&mut self) -> Option<Effect> {
        let ticket = self.begin(RequestKind::Run)?;
        self.output = OutputPane::Running;
        self.correction = CorrectionPane::Empty;
        self.visualizer = None;
        self.notice = None;
        if self.prompt == Some(Prompt::OfferCorrection) {
            self.prompt = None;
        }
        let req = RunRequest {
            code: self.code.clone(),
            language: self.language.as_str().to_string(),
            user_input: self.stdin.clone(),
        };
        Some(Effect::Run(ticket, req))
    }

    pub fn complete_run(&mut self, ticket: Ticket, outcome: Result<RunResult, ClientError>) {
        let Some(flight) = self.finish(ticket) else {
            return;
        };
        let ok = matches!(&outcome, Ok(r) if r.is_success());
        let status = if ok { EntryStatus::Success } else { EntryStatus::Error };
        self.history
            .record(HistoryEntry::new(flight.code, status, EntrySource::Run).with_language(flight.language.as_str()));

        if ticket.generation != self.generation {
            tracing::warn!(issued = ticket.generation, current = self.generation, "discarding stale run result");
            self.output = OutputPane::Placeholder;
            self.notice = Some(STALE_RESULT_MESSAGE.into());
            return;
        }

        match outcome {
            Ok(result) if ok => {
                tracing::info!(steps = result.steps().len(), "run succeeded");
                self.output = OutputPane::Success(result.output_text().to_string());
                self.status = Some(RunStatus::Success);
                self.toggles = Toggles::default();
                self.visualizer = None;
                self.last_result = Some(result);
            }
            Ok(result) => {
                tracing::info!("run reported an error");
                self.output = OutputPane::Error(result.error_text().to_string());
                self.fail_run();
                self.prompt = Some(Prompt::OfferCorrection);
            }
            Err(e) => {
                tracing::error!(error = %e, "run request failed");
                self.output = OutputPane::Error(RUN_FAILED_MESSAGE.into());
                self.fail_run();
            }
        }
    }

    /// Ask the backend to correct the current code. Shares the in-flight
    /// guard with runs.
    pub fn request_correction(&mut self) -> Option<Effect> {
        let ticket = self.begin(RequestKind::Correct)?;
        self.correction = CorrectionPane::Pending;
        if self.prompt == Some(Prompt::OfferCorrection) {
            self.prompt = None;
        }
        Some(Effect::Correct(ticket, CorrectRequest { code: self.code.clone() }))
    }

    pub fn complete_correction(&mut self, ticket: Ticket, outcome: Result<CorrectResult, ClientError>) {
        if self.finish(ticket).is_none() {
            return;
        }
        let stale = ticket.generation != self.generation;

        let pane = match outcome {
            Ok(CorrectResult { error: Some(error), .. }) if !error.is_empty() => CorrectionPane::Failed(error),
            Ok(CorrectResult { corrected_code: Some(code), explanation, .. }) if !code.is_empty() => {
                self.history
                    .record(HistoryEntry::new(code.clone(), EntryStatus::Corrected, EntrySource::AutoCorrect));
                CorrectionPane::Corrected { code, explanation: explanation.filter(|e| !e.trim().is_empty()) }
            }
            Ok(_) => CorrectionPane::Failed(NO_CORRECTION_MESSAGE.into()),
            Err(e) => {
                tracing::error!(error = %e, "auto-correct request failed");
                CorrectionPane::Failed(CORRECT_FAILED_MESSAGE.into())
            }
        };

        if stale {
            tracing::warn!(issued = ticket.generation, current = self.generation, "discarding stale correction");
            self.correction = CorrectionPane::Empty;
            self.notice = Some(STALE_RESULT_MESSAGE.into());
        } else {
            self.correction = pane;
        }
    }

    /// Record a copy of the corrected code and hand it back for the
    /// clipboard. The editor is left alone.
    pub fn copy_corrected(&mut self) -> Option<String> {
        let CorrectionPane::Corrected { code, .. } = &self.correction else {
            self.notice = Some("No corrected code to copy.".into());
            return None;
        };
        let code = code.clone();
        self.history
            .record(HistoryEntry::new(code.clone(), EntryStatus::Copied, EntrySource::CopyCorrected));
        Some(code)
    }

    // ----- feature toggles -----

    /// Flip a feature toggle. Rejected unless the last run succeeded.
    pub fn toggle(&mut self, feature: Feature) -> Result<bool, GateError> {
        if !self.toggles_enabled() {
            let err = GateError::NotRunSuccessfully(feature);
            self.notice = Some(err.to_string());
            return Err(err);
        }
        self.notice = None;
        let on = match feature {
            Feature::Questions => {
                self.toggles.questions = !self.toggles.questions;
                self.toggles.questions
            }
            Feature::Visualizer => {
                self.toggles.visualizer = !self.toggles.visualizer;
                self.visualizer = if self.toggles.visualizer {
                    let steps = self.last_result.as_ref().map(|r| r.steps().to_vec()).unwrap_or_default();
                    StepVisualizer::new(steps, self.code.clone())
                } else {
                    None
                };
                self.toggles.visualizer
            }
        };
        Ok(on)
    }

    // ----- history and prompts -----

    pub fn select_history(&mut self, index: usize) -> Result<(), HistoryError> {
        if let Err(e) = self.history.select(index) {
            self.notice = Some(e.to_string());
            return Err(e);
        }
        self.prompt = Some(Prompt::LoadHistory(index));
        Ok(())
    }

    pub fn request_clear_history(&mut self) {
        self.prompt = Some(Prompt::ClearHistory);
    }

    /// Answer "yes" to the open prompt.
    pub fn confirm_prompt(&mut self) -> Option<Effect> {
        match self.prompt.take()? {
            Prompt::LoadHistory(_) => {
                match self.history.confirm() {
                    Ok(entry) => {
                        if let Some(lang) = entry.language.as_deref().and_then(|l| l.parse().ok()) {
                            self.language = lang;
                        }
                        self.edit(entry.code);
                    }
                    Err(e) => {
                        tracing::error!("{e}");
                        self.notice = Some(e.to_string());
                    }
                }
                None
            }
            Prompt::ClearHistory => {
                self.history.clear();
                None
            }
            Prompt::OfferCorrection => self.request_correction(),
        }
    }

    /// Answer "no" to the open prompt.
    pub fn cancel_prompt(&mut self) {
        if let Some(Prompt::LoadHistory(_)) = self.prompt.take() {
            self.history.cancel();
        }
    }
}
