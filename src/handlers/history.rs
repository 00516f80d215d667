//! `--history`, `--show-history N`, `--clear-history`.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::config::Config;
use crate::highlight::Language;
use crate::history::{EntryStatus, HistoryStore};
use crate::printer::CodePrinter;
use crate::store::LocalStore;

fn load(cfg: &Config) -> HistoryStore {
    HistoryStore::load(LocalStore::from_config(cfg), cfg.history_length())
}

pub fn list(cfg: &Config) {
    let history = load(cfg);
    if history.is_empty() {
        println!("No history yet.");
        return;
    }
    for (i, entry) in history.entries().iter().enumerate() {
        let label = format!("{:<9}", entry.status.as_str());
        let status = match entry.status {
            EntryStatus::Success => label.green().to_string(),
            EntryStatus::Error => label.red().to_string(),
            _ => label.yellow().to_string(),
        };
        println!("{:>3}  {} {:>8}  {}", i, status, entry.time_display(), entry.preview().replace('\n', " "));
    }
}

pub fn show(cfg: &Config, index: usize) -> Result<()> {
    let history = load(cfg);
    let entry = history
        .get(index)
        .with_context(|| format!("no history entry {} (have {})", index, history.len()))?;
    let language = entry
        .language
        .as_deref()
        .and_then(|l| l.parse::<Language>().ok())
        .unwrap_or_else(|| cfg.default_language());
    CodePrinter::new(language).print(entry.code.trim_end_matches('\n'));
    Ok(())
}

pub fn clear(cfg: &Config) {
    let mut history = load(cfg);
    let n = history.len();
    history.clear();
    println!("Cleared {} history entries.", n);
}
