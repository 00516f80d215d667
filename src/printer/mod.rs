//! Printers: text, markdown (termimad) and highlighted source.

use owo_colors::OwoColorize;
use termimad::MadSkin;

use crate::highlight::{tokenize_lines, Language, TokenKind};

pub struct TextPrinter {
    pub color: Option<&'static str>,
}

impl TextPrinter {
    pub fn print(&self, text: &str) {
        if let Some(c) = self.color {
            match c {
                "green" => println!("{}", text.green()),
                "red" => println!("{}", text.red()),
                "cyan" => println!("{}", text.cyan()),
                "magenta" => println!("{}", text.magenta()),
                "yellow" => println!("{}", text.yellow()),
                "dimmed" => println!("{}", text.dimmed()),
                _ => println!("{}", text),
            }
        } else {
            println!("{}", text);
        }
    }
}

pub struct MarkdownPrinter {
    pub skin: MadSkin,
    pub width: usize,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self { skin: MadSkin::default(), width: 100 }
    }
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) { self.skin.print_text(text); println!(); }
}

/// Prints source code with ANSI colours, optionally with line numbers.
pub struct CodePrinter {
    pub language: Language,
    pub line_numbers: bool,
}

impl CodePrinter {
    pub fn new(language: Language) -> Self {
        Self { language, line_numbers: false }
    }

    pub fn print(&self, src: &str) {
        println!("{}", self.render(src));
    }

    pub fn render(&self, src: &str) -> String {
        let lines = tokenize_lines(src, self.language);
        let gutter = lines.len().to_string().len();
        let mut out = String::with_capacity(src.len() * 2);
        for (n, line) in lines.iter().enumerate() {
            if n > 0 {
                out.push('\n');
            }
            if self.line_numbers {
                out.push_str(&format!("{:>gutter$} │ ", n + 1).dimmed().to_string());
            }
            for (kind, text) in line {
                out.push_str(&paint(*kind, text));
            }
        }
        out
    }
}

fn paint(kind: TokenKind, text: &str) -> String {
    match kind {
        TokenKind::Comment => text.bright_black().italic().to_string(),
        TokenKind::String => text.green().to_string(),
        TokenKind::Number => text.yellow().to_string(),
        TokenKind::Keyword => text.magenta().bold().to_string(),
        TokenKind::Function => text.blue().to_string(),
        TokenKind::Operator => text.cyan().to_string(),
        TokenKind::Bracket => text.bright_white().to_string(),
        TokenKind::Plain => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\u{1b}' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn colouring_preserves_text() {
        let src = "def f(x):\n    return x + 1  # inc";
        let out = CodePrinter::new(Language::Python).render(src);
        assert_ne!(out, src);
        assert_eq!(strip_ansi(&out), src);
    }

    #[test]
    fn line_numbers_are_padded() {
        let src = (0..10).map(|i| format!("x = {i}")).collect::<Vec<_>>().join("\n");
        let printer = CodePrinter { language: Language::Python, line_numbers: true };
        let plain = strip_ansi(&printer.render(&src));
        let lines: Vec<_> = plain.lines().collect();
        assert!(lines[0].starts_with(" 1 │ x"));
        assert!(lines[9].starts_with("10 │ x"));
    }
}
