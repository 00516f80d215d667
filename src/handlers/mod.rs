//! One handler per command-line mode.

pub mod chat;
pub mod correct;
pub mod highlight;
pub mod history;
pub mod run;
pub mod tui;

use std::io::{self, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use is_terminal::IsTerminal;

use crate::config::Config;
use crate::highlight::Language;
use crate::history::HistoryStore;
use crate::session::Session;
use crate::store::LocalStore;

/// Source text from `file`, or from piped stdin when no file is given.
pub fn read_source(file: Option<&Path>) -> Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()));
    }
    let stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("provide a source FILE or pipe the code through stdin");
    }
    let mut buf = String::new();
    stdin.lock().read_to_string(&mut buf)?;
    Ok(buf)
}

/// `--language` wins, then the file extension, then DEFAULT_LANGUAGE.
pub fn resolve_language(flag: Option<&str>, file: Option<&Path>, cfg: &Config) -> Result<Language> {
    if let Some(name) = flag {
        return name.parse::<Language>().map_err(anyhow::Error::msg);
    }
    let from_ext = file
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .and_then(Language::from_extension);
    Ok(from_ext.unwrap_or_else(|| cfg.default_language()))
}

/// A session backed by the persistent history.
pub fn open_session(cfg: &Config, language: Language) -> Session {
    let history = HistoryStore::load(LocalStore::from_config(cfg), cfg.history_length());
    Session::new(history, language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_resolution_order() {
        let cfg = Config::from_pairs([("DEFAULT_LANGUAGE", "java")]);
        let file = Path::new("prog.cpp");
        assert_eq!(resolve_language(Some("c"), Some(file), &cfg).unwrap(), Language::C);
        assert_eq!(resolve_language(None, Some(file), &cfg).unwrap(), Language::Cpp);
        assert_eq!(resolve_language(None, Some(Path::new("notes.txt")), &cfg).unwrap(), Language::Java);
        assert_eq!(resolve_language(None, None, &cfg).unwrap(), Language::Java);
        assert!(resolve_language(Some("cobol"), None, &cfg).is_err());
    }

    #[test]
    fn reads_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.py");
        std::fs::write(&path, "print(1)\n").unwrap();
        assert_eq!(read_source(Some(&path)).unwrap(), "print(1)\n");
        assert!(read_source(Some(&dir.path().join("missing.py"))).is_err());
    }
}
