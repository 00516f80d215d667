//! UI layout and rendering logic for the TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::app::{App, Focus};
use crate::chat::{ChatPart, Sender};
use crate::highlight::{tokenize_lines, Language, TokenKind};
use crate::history::EntryStatus;
use crate::session::{CorrectionPane, OutputPane, Prompt, QuestionsView, RunStatus};
use crate::utils::unicode::display_width_to;

/// Render the main UI
pub fn render_ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Panes
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(main_layout[0]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(5)])
        .split(columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30), // Output
            Constraint::Percentage(30), // Corrected code
            Constraint::Percentage(40), // Visualizer + questions
        ])
        .split(columns[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(right[2]);

    render_editor(frame, app, left[0]);
    render_stdin(frame, app, left[1]);
    render_output(frame, app, right[0]);
    render_correction(frame, app, right[1]);
    render_visualizer(frame, app, bottom[0]);
    render_questions(frame, app, bottom[1]);
    render_status_bar(frame, app, main_layout[1]);

    if app.session.history().is_visible() {
        render_history_overlay(frame, app);
    }
    if app.chat.visible {
        render_chat_window(frame, app);
    }
    if let Some(prompt) = app.session.prompt() {
        render_prompt(frame, app, prompt);
    }
    if app.show_help {
        render_help_overlay(frame);
    }
}

fn token_style(kind: TokenKind) -> Style {
    match kind {
        TokenKind::Comment => Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        TokenKind::String => Style::default().fg(Color::Green),
        TokenKind::Number => Style::default().fg(Color::Yellow),
        TokenKind::Keyword => Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        TokenKind::Function => Style::default().fg(Color::Blue),
        TokenKind::Operator => Style::default().fg(Color::Cyan),
        TokenKind::Bracket => Style::default().fg(Color::White),
        TokenKind::Plain => Style::default(),
    }
}

/// Syntax-highlighted lines, optionally with a line-number gutter.
fn highlighted_lines(src: &str, lang: Language, gutter: Option<usize>) -> Vec<Line<'_>> {
    tokenize_lines(src, lang)
        .into_iter()
        .enumerate()
        .map(|(n, fragments)| {
            let mut spans = Vec::with_capacity(fragments.len() + 1);
            if let Some(width) = gutter {
                spans.push(Span::styled(format!("{:>width$} ", n + 1), Style::default().fg(Color::DarkGray)));
            }
            spans.extend(fragments.into_iter().map(|(kind, text)| Span::styled(text, token_style(kind))));
            Line::from(spans)
        })
        .collect()
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Block::default().borders(Borders::ALL).title(title).title_style(style)
}

fn placeholder(text: &str) -> Paragraph<'_> {
    Paragraph::new(text).style(Style::default().fg(Color::DarkGray)).wrap(Wrap { trim: true })
}

/// Render the code editor
fn render_editor(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Editor;
    let code = app.session.code();
    let gutter = app.editor.lines().len().to_string().len();
    let height = area.height.saturating_sub(2) as usize;
    let scroll = app.editor.scroll_for(height);

    let title = format!("Code ({}) - F8 language", app.session.language());
    let paragraph = Paragraph::new(Text::from(highlighted_lines(code, app.session.language(), Some(gutter))))
        .block(pane_block(title, focused))
        .scroll((scroll as u16, 0));
    frame.render_widget(paragraph, area);

    if focused && !app.chat.visible && app.session.prompt().is_none() && !app.session.history().is_visible() {
        let (row, col) = app.editor.cursor();
        let line = &app.editor.lines()[row];
        let x = area.x + 1 + gutter as u16 + 1 + display_width_to(line, col) as u16;
        let y = area.y + 1 + (row - scroll) as u16;
        if x < (area.x + area.width).saturating_sub(1) && y < (area.y + area.height).saturating_sub(1) {
            frame.set_cursor_position((x, y));
        }
    }
}

/// Render the program input area
fn render_stdin(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Input;
    let paragraph = if app.stdin.is_empty() && !focused {
        placeholder("Program input (stdin). Tab to focus.")
    } else {
        Paragraph::new(app.stdin.text())
    };
    let height = area.height.saturating_sub(2) as usize;
    let scroll = app.stdin.scroll_for(height);
    frame.render_widget(paragraph.block(pane_block("Input".into(), focused)).scroll((scroll as u16, 0)), area);

    if focused {
        let (row, col) = app.stdin.cursor();
        let x = area.x + 1 + display_width_to(&app.stdin.lines()[row], col) as u16;
        let y = area.y + 1 + (row - scroll) as u16;
        if x < (area.x + area.width).saturating_sub(1) && y < (area.y + area.height).saturating_sub(1) {
            frame.set_cursor_position((x, y));
        }
    }
}

fn render_output(frame: &mut Frame, app: &App, area: Rect) {
    let paragraph = match app.session.output() {
        OutputPane::Placeholder => placeholder("Run your code (F5) to see the output here."),
        OutputPane::Running => Paragraph::new("Running...").style(Style::default().fg(Color::Yellow)),
        OutputPane::Success(out) => Paragraph::new(out.as_str()).wrap(Wrap { trim: false }),
        OutputPane::Error(err) => Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red)).wrap(Wrap { trim: false }),
    };
    let title = match app.session.status() {
        Some(RunStatus::Success) => "Output - success",
        Some(RunStatus::Error) => "Output - error",
        None => "Output",
    };
    frame.render_widget(paragraph.block(pane_block(title.into(), false)), area);
}

fn render_correction(frame: &mut Frame, app: &App, area: Rect) {
    let paragraph = match app.session.correction() {
        CorrectionPane::Empty => placeholder("Press F6 to auto-correct the code."),
        CorrectionPane::Pending => Paragraph::new("Correcting...").style(Style::default().fg(Color::Yellow)),
        CorrectionPane::Corrected { code, explanation } => {
            let mut lines: Vec<Line> = Text::raw(code.as_str()).lines;
            if let Some(explanation) = explanation {
                lines.push(Line::from(""));
                lines.extend(explanation.lines().map(|l| Line::styled(l, Style::default().fg(Color::Cyan))));
            }
            Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false })
        }
        CorrectionPane::Failed(msg) => Paragraph::new(msg.as_str()).style(Style::default().fg(Color::Red)),
    };
    let title = match app.session.correction() {
        CorrectionPane::Corrected { .. } => "Corrected code - Ctrl+Y to copy",
        _ => "Corrected code",
    };
    frame.render_widget(paragraph.block(pane_block(title.into(), false)), area);
}

fn render_visualizer(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Visualizer;
    let Some(viz) = app.session.visualizer() else {
        let text = app.session.visualizer_placeholder().unwrap_or_default();
        frame.render_widget(placeholder(text).block(pane_block("Visualizer (F2)".into(), focused)), area);
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let current_line = viz.frame().iter().position(|l| l.current);
    let lines: Vec<Line> = viz
        .frame()
        .into_iter()
        .map(|l| {
            let text = format!("{:>3} {}", l.number + 1, l.text);
            if l.current {
                Line::styled(text, Style::default().bg(Color::Blue).fg(Color::White))
            } else {
                Line::from(text)
            }
        })
        .collect();
    let height = layout[0].height.saturating_sub(2) as usize;
    let scroll = current_line.map(|n| (n + 1).saturating_sub(height)).unwrap_or(0);

    let state = if viz.is_playing() { "playing" } else { "paused" };
    let title = format!("Visualizer - step {}/{} ({})", viz.index() + 1, viz.len(), state);
    frame.render_widget(
        Paragraph::new(Text::from(lines)).block(pane_block(title, focused)).scroll((scroll as u16, 0)),
        layout[0],
    );

    let prev = if viz.can_step_back() { "<-" } else { "  " };
    let next = if viz.can_step_forward() { "->" } else { "  " };
    let description = Paragraph::new(viz.description())
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(format!("{prev} Space {next}")));
    frame.render_widget(description, layout[1]);
}

fn render_questions(frame: &mut Frame, app: &App, area: Rect) {
    let block = pane_block("Questions (F3)".into(), false);
    match app.session.questions_view() {
        QuestionsView::Placeholder(text) => frame.render_widget(placeholder(text).block(block), area),
        QuestionsView::List(questions) => {
            let lines: Vec<Line> = questions.into_iter().map(|q| Line::from(format!("- {q}"))).collect();
            frame.render_widget(Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true }).block(block), area);
        }
    }
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status_paragraph =
        Paragraph::new(app.status_line()).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status_paragraph, area);
}

fn render_history_overlay(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect(70, 60, frame.area());
    frame.render_widget(Clear, popup_area);

    let items: Vec<ListItem> = app
        .session
        .history()
        .entries()
        .iter()
        .map(|entry| {
            let color = match entry.status {
                EntryStatus::Success => Color::Green,
                EntryStatus::Error => Color::Red,
                _ => Color::Yellow,
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>8} ", entry.time_display()), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{:<9} ", entry.status.as_str()), Style::default().fg(color)),
                Span::raw(entry.preview().replace('\n', " ")),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("History - Enter load | Ctrl+L clear | Esc close")
                .title_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    state.select(Some(app.history_cursor));
    frame.render_stateful_widget(list, popup_area, &mut state);
}

fn render_prompt(frame: &mut Frame, app: &App, prompt: Prompt) {
    let question = match prompt {
        Prompt::OfferCorrection => "Your code has errors. Would you like to auto-correct it?".to_string(),
        Prompt::LoadHistory(i) => {
            let preview = app.session.history().get(i).map(|e| e.preview()).unwrap_or_default();
            format!("Load this code into the editor?\n\n{}", preview.replace('\n', " "))
        }
        Prompt::ClearHistory => "Are you sure you want to clear all history?".to_string(),
    };
    let area = centered_rect(50, 25, frame.area());
    frame.render_widget(Clear, area);
    let text = Text::from(vec![
        Line::from(question),
        Line::from(""),
        Line::styled("[y] yes    [n] no", Style::default().fg(Color::Yellow)),
    ]);
    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Confirm"));
    frame.render_widget(paragraph, area);
}

fn render_chat_window(frame: &mut Frame, app: &App) {
    let Some(window) = app.chat_window else {
        return;
    };
    let area = window.rect().intersection(frame.area());
    frame.render_widget(Clear, area);

    let focused = app.focus == Focus::Chat;
    let block = pane_block("Assistant - drag title to move, corner to resize".into(), focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let mut lines: Vec<Line> = Vec::new();
    for bubble in &app.chat.messages {
        let (who, style) = match bubble.sender {
            Sender::User => ("you", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Sender::Bot => ("assistant", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        };
        lines.push(Line::styled(who, style));
        for part in bubble.parts() {
            match part {
                ChatPart::Text(text) => lines.extend(text.lines().map(|l| Line::from(l.to_string()))),
                ChatPart::Code { language, content } => {
                    let lang = language.as_deref().and_then(|l| l.parse().ok()).unwrap_or(app.session.language());
                    for line in highlighted_lines(&content, lang, None) {
                        let spans: Vec<Span> = line
                            .spans
                            .into_iter()
                            .map(|s| Span::styled(s.content.into_owned(), s.style.bg(Color::Black)))
                            .collect();
                        lines.push(Line::from(spans));
                    }
                }
            }
        }
        lines.push(Line::from(""));
    }
    if let Some(partial) = app.chat.streaming_reply() {
        lines.push(Line::styled("assistant", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)));
        lines.extend(partial.lines().map(|l| Line::from(l.to_string())));
    } else if app.chat.is_typing() {
        lines.push(Line::styled("assistant is typing...", Style::default().fg(Color::DarkGray)));
    }

    let height = layout[0].height as usize;
    let scroll = lines.len().saturating_sub(height) as u16;
    frame.render_widget(Paragraph::new(Text::from(lines)).scroll((scroll, 0)), layout[0]);

    let input = Paragraph::new(format!("> {}", app.chat.input)).style(Style::default().fg(Color::White));
    frame.render_widget(input, layout[1]);
    if focused {
        let x = layout[1].x + 2 + display_width_to(&app.chat.input, app.chat.input.chars().count()) as u16;
        if x < layout[1].x + layout[1].width {
            frame.set_cursor_position((x, layout[1].y));
        }
    }

    // Resize handle
    if area.width > 1 && area.height > 1 {
        let corner = Rect::new(area.x + area.width - 1, area.y + area.height - 1, 1, 1);
        frame.render_widget(Paragraph::new("◢").style(Style::default().fg(Color::Yellow)), corner);
    }
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame) {
    let popup_area = centered_rect(70, 80, frame.area());
    frame.render_widget(Clear, popup_area);

    let help_lines = vec![
        Line::from("Code Debugger"),
        Line::from(""),
        Line::from("Code:"),
        Line::from("  F5 / Ctrl+R  - Run code"),
        Line::from("  F6           - Auto-correct code"),
        Line::from("  Ctrl+Y       - Copy the corrected code"),
        Line::from("  F8           - Switch language"),
        Line::from("  Paste        - Replace the editor content"),
        Line::from("  Tab          - Cycle editor / input / visualizer / chat"),
        Line::from(""),
        Line::from("After a successful run:"),
        Line::from("  F2           - Toggle step visualizer (←/→ step, Space play)"),
        Line::from("  F3           - Toggle learning questions"),
        Line::from(""),
        Line::from("History:"),
        Line::from("  F4           - Show history (Enter to load)"),
        Line::from("  Ctrl+L       - Clear history"),
        Line::from(""),
        Line::from("Assistant:"),
        Line::from("  F7           - Open/close chat"),
        Line::from("  Alt+arrows   - Move window (Alt+Shift resizes)"),
        Line::from(""),
        Line::from("  F1 help | Ctrl+C / Ctrl+Q quit | any key closes this"),
    ];

    let help_paragraph = Paragraph::new(Text::from(help_lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .title_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(help_paragraph, popup_area);
}

/// Helper function to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
