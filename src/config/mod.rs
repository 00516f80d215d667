use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;

use crate::highlight::Language;

pub const DEFAULT_DEBUG_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_CHAT_API_BASE_URL: &str = "https://api.mistral.ai/v1";

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut map = default_map();
        let config_path = default_config_path();

        // Read .codedbgrc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    if let Some((k, v)) = parse_line(&line) {
                        map.insert(k, v);
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    /// Build a config from explicit pairs on top of the defaults, ignoring the
    /// rc file and the environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut inner = default_map();
        for (k, v) in pairs {
            inner.insert(k.into(), v.into());
        }
        Self { inner, config_path: default_config_path() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse::<u64>().ok())
    }

    pub fn debug_api_url(&self) -> String {
        self.get("DEBUG_API_URL")
            .unwrap_or_else(|| DEFAULT_DEBUG_API_URL.into())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn chat_api_base_url(&self) -> String {
        self.get("CHAT_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_CHAT_API_BASE_URL.into())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("REQUEST_TIMEOUT").unwrap_or(60))
    }

    pub fn playback_interval(&self) -> Duration {
        Duration::from_millis(self.get_u64("PLAYBACK_INTERVAL_MS").unwrap_or(1000).max(50))
    }

    pub fn history_length(&self) -> usize {
        self.get_usize("HISTORY_LENGTH").filter(|n| *n > 0).unwrap_or(50)
    }

    pub fn default_language(&self) -> Language {
        self.get("DEFAULT_LANGUAGE")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn data_path(&self) -> PathBuf {
        self.get("DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_path)
    }

    pub fn log_file(&self) -> PathBuf {
        self.get("LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| self.data_path().join("codedbg.log"))
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (k, v) = line.split_once('=')?;
    Some((k.trim().to_string(), v.trim().to_string()))
}

fn is_config_key(k: &str) -> bool {
    // Accept known keys or CODEDBG_* for forward-compat
    const KEYS: &[&str] = &[
        "DEBUG_API_URL",
        "CHAT_API_BASE_URL",
        "MISTRAL_API_KEY",
        "CHAT_MODEL",
        "CHAT_TEMPERATURE",
        "CHAT_MAX_TOKENS",
        "REQUEST_TIMEOUT",
        "DATA_PATH",
        "HISTORY_LENGTH",
        "DEFAULT_LANGUAGE",
        "PLAYBACK_INTERVAL_MS",
        "LOG_FILE",
    ];

    KEYS.contains(&k) || k.starts_with("CODEDBG_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("codedbg").join(".codedbgrc")
}

fn default_data_path() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.data_dir().to_path_buf())
        .unwrap_or_else(env::temp_dir)
        .join("codedbg")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    // Endpoints
    m.insert("DEBUG_API_URL".into(), DEFAULT_DEBUG_API_URL.into());
    m.insert("CHAT_API_BASE_URL".into(), DEFAULT_CHAT_API_BASE_URL.into());
    m.insert("CHAT_MODEL".into(), "mistral-medium".into());

    // Paths
    m.insert("DATA_PATH".into(), default_data_path().to_string_lossy().into_owned());

    // Numbers
    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m.insert("HISTORY_LENGTH".into(), "50".into());
    m.insert("PLAYBACK_INTERVAL_MS".into(), "1000".into());

    // Strings
    m.insert("DEFAULT_LANGUAGE".into(), "python".into());

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rc_lines() {
        assert_eq!(parse_line("  # comment"), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("A = b=c"), Some(("A".into(), "b=c".into())));
    }

    #[test]
    fn defaults() {
        let cfg = Config::from_pairs(Vec::<(String, String)>::new());
        assert_eq!(cfg.debug_api_url(), DEFAULT_DEBUG_API_URL);
        assert_eq!(cfg.history_length(), 50);
        assert_eq!(cfg.default_language(), Language::Python);
        assert_eq!(cfg.playback_interval(), Duration::from_millis(1000));
        assert_eq!(cfg.get("CHAT_MODEL").as_deref(), Some("mistral-medium"));
    }

    #[test]
    fn overrides_and_bad_values() {
        let cfg = Config::from_pairs([
            ("DEBUG_API_URL", "http://localhost:9000/"),
            ("HISTORY_LENGTH", "0"),
            ("DEFAULT_LANGUAGE", "cobol"),
        ]);
        assert_eq!(cfg.debug_api_url(), "http://localhost:9000");
        assert_eq!(cfg.history_length(), 50);
        assert_eq!(cfg.default_language(), Language::Python);
    }

    #[test]
    fn env_keys() {
        assert!(is_config_key("MISTRAL_API_KEY"));
        assert!(is_config_key("CODEDBG_ANYTHING"));
        assert!(!is_config_key("PATH"));
    }
}
