//! `--run`: execute the code once on the backend and print the outcome.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::client::DebugClient;
use crate::config::Config;
use crate::highlight::Language;
use crate::printer::TextPrinter;
use crate::session::{Effect, Feature, OutputPane, Prompt, QuestionsView, Session};

pub struct RunOptions {
    pub stdin: Option<String>,
    pub stdin_file: Option<PathBuf>,
    pub questions: bool,
    pub steps: bool,
}

pub struct RunHandler;

impl RunHandler {
    /// Returns whether the program ran successfully.
    pub async fn run(cfg: &Config, code: &str, language: Language, opts: RunOptions) -> Result<bool> {
        let client = DebugClient::from_config(cfg)?;
        let mut session = super::open_session(cfg, language);
        session.edit(code);

        let stdin = match (&opts.stdin, &opts.stdin_file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read program input {}", path.display()))?,
            (None, None) => String::new(),
        };
        session.set_stdin(stdin);

        let Some(Effect::Run(ticket, req)) = session.request_run() else {
            anyhow::bail!("could not start the run");
        };
        tracing::info!(url = client.base_url(), language = %language, "running code");
        let outcome = client.run(&req).await;
        session.complete_run(ticket, outcome);

        Ok(print_outcome(&mut session, &opts))
    }
}

fn print_outcome(session: &mut Session, opts: &RunOptions) -> bool {
    match session.output().clone() {
        OutputPane::Success(out) => {
            TextPrinter { color: None }.print(out.trim_end_matches('\n'));
        }
        OutputPane::Error(err) => {
            TextPrinter { color: Some("red") }.print(err.trim_end_matches('\n'));
            if session.prompt() == Some(Prompt::OfferCorrection) {
                TextPrinter { color: Some("yellow") }.print("Run again with --correct for an auto-corrected version.");
            }
            return false;
        }
        OutputPane::Placeholder | OutputPane::Running => return false,
    }

    if opts.steps && session.toggle(Feature::Visualizer).unwrap_or(false) {
        print_steps(session);
    }
    if opts.questions && session.toggle(Feature::Questions).unwrap_or(false) {
        print_questions(session);
    }
    true
}

fn print_steps(session: &Session) {
    let Some(viz) = session.visualizer() else {
        TextPrinter { color: Some("dimmed") }.print(session.visualizer_placeholder().unwrap_or_default());
        return;
    };
    TextPrinter { color: Some("cyan") }.print(&format!("\nExecution steps ({}):", viz.len()));
    for step in session.last_result().map(|r| r.steps()).unwrap_or_default() {
        let line = session.code().split('\n').nth(step.line_number).unwrap_or("").trim();
        println!("  {:>3}: {:<40} {}", step.line_number + 1, line, step.step_description);
    }
}

fn print_questions(session: &Session) {
    TextPrinter { color: Some("cyan") }.print("\nQuestions:");
    match session.questions_view() {
        QuestionsView::List(questions) => {
            for q in questions {
                println!("  - {q}");
            }
        }
        QuestionsView::Placeholder(text) => TextPrinter { color: Some("dimmed") }.print(text),
    }
}
