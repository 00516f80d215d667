//! Interactive mode.

use std::io;

use anyhow::Result;
use is_terminal::IsTerminal;

use crate::config::Config;
use crate::highlight::Language;
use crate::tui::run_tui;

pub async fn run(cfg: Config, code: Option<String>, language: Language) -> Result<()> {
    if !io::stdout().is_terminal() {
        eprintln!("Warning: the interactive debugger needs a terminal.");
        eprintln!("Use --run, --correct or --highlight for non-interactive use.");
        return Err(anyhow::anyhow!("TUI mode requires a proper terminal environment"));
    }
    run_tui(cfg, code, language).await
}
