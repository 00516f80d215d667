use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "codedbg", about = "Terminal code debugger: run, auto-correct and step through code", version)]
#[command(group(ArgGroup::new("mode").args(["run", "correct", "highlight", "chat", "history", "show_history", "clear_history"]).multiple(false)))]
#[command(group(ArgGroup::new("stdin_source").args(["input", "input_file"]).multiple(false)))]
pub struct Cli {
    /// Source file to load. Without a mode flag it opens in the TUI; `--run`,
    /// `--correct` and `--highlight` read stdin when it is omitted.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Source language (python, c, cpp, java). Defaults to DEFAULT_LANGUAGE.
    #[arg(short = 'L', long)]
    pub language: Option<String>,

    /// Execution backend base URL (overrides DEBUG_API_URL).
    #[arg(long = "api-url")]
    pub api_url: Option<String>,

    /// Run the code once and print its output or error.
    #[arg(short = 'r', long)]
    pub run: bool,

    /// Text fed to the program's standard input.
    #[arg(long, requires = "run")]
    pub input: Option<String>,

    /// Read the program's standard input from a file.
    #[arg(long = "input-file", requires = "run")]
    pub input_file: Option<PathBuf>,

    /// Also print the learning questions of a successful run.
    #[arg(long, requires = "run")]
    pub questions: bool,

    /// Also print the execution steps of a successful run.
    #[arg(long, requires = "run")]
    pub steps: bool,

    /// Ask the backend to auto-correct the code.
    #[arg(short = 'c', long)]
    pub correct: bool,

    /// Print the code with syntax highlighting.
    #[arg(long)]
    pub highlight: bool,

    /// With --highlight, print the HTML rendering instead of ANSI colours.
    #[arg(long, requires = "highlight")]
    pub html: bool,

    /// Ask the coding assistant a single question.
    #[arg(long, value_name = "PROMPT")]
    pub chat: Option<String>,

    /// Print the chat reply as it streams instead of rendering Markdown.
    #[arg(long = "no-md", requires = "chat")]
    pub no_md: bool,

    /// List saved history entries.
    #[arg(long)]
    pub history: bool,

    /// Print the code of history entry N (0 = newest).
    #[arg(long = "show-history", value_name = "N")]
    pub show_history: Option<usize>,

    /// Delete all saved history.
    #[arg(long = "clear-history")]
    pub clear_history: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// True when no one-shot mode was requested.
    pub fn is_interactive(&self) -> bool {
        !(self.run
            || self.correct
            || self.highlight
            || self.chat.is_some()
            || self.history
            || self.show_history.is_some()
            || self.clear_history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_is_interactive() {
        let cli = Cli::try_parse_from(["codedbg", "main.py"]).unwrap();
        assert!(cli.is_interactive());
        assert_eq!(cli.file.as_deref(), Some(std::path::Path::new("main.py")));
    }

    #[test]
    fn modes_are_exclusive() {
        assert!(Cli::try_parse_from(["codedbg", "--run", "--correct", "a.py"]).is_err());
        assert!(Cli::try_parse_from(["codedbg", "--history", "--clear-history"]).is_err());
    }

    #[test]
    fn run_options_require_run() {
        assert!(Cli::try_parse_from(["codedbg", "--steps", "a.py"]).is_err());
        assert!(Cli::try_parse_from(["codedbg", "--run", "--input", "1", "--input-file", "x", "a.py"]).is_err());
        let cli = Cli::try_parse_from(["codedbg", "--run", "--steps", "--input", "5", "a.py"]).unwrap();
        assert!(cli.run && cli.steps);
        assert_eq!(cli.input.as_deref(), Some("5"));
    }

    #[test]
    fn chat_takes_prompt() {
        let cli = Cli::try_parse_from(["codedbg", "--chat", "what is a list?", "--no-md"]).unwrap();
        assert_eq!(cli.chat.as_deref(), Some("what is a list?"));
        assert!(cli.no_md);
        assert!(!cli.is_interactive());
    }
}
