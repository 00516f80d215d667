//! File-backed key/value store: one file per key under the data directory.

use std::{fs, io, path::PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::Config;

pub const HISTORY_KEY: &str = "history";
pub const FEATURES_SHOWN_KEY: &str = "features_shown";

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.data_path())
    }

    pub fn new(root: PathBuf) -> Self {
        let _ = fs::create_dir_all(&root);
        Self { root }
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    pub fn exists(&self, key: &str) -> bool {
        self.file_path(key).exists()
    }

    /// Read and decode `key`; a missing key is `Ok(None)`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let p = self.file_path(key);
        let text = match fs::read_to_string(&p) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", p.display())),
        };
        let value = serde_json::from_str(&text).with_context(|| format!("corrupt value in {}", p.display()))?;
        Ok(Some(value))
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let p = self.file_path(key);
        fs::create_dir_all(&self.root)?;
        fs::write(&p, serde_json::to_string(value)?).with_context(|| format!("failed to write {}", p.display()))?;
        Ok(())
    }

    pub fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.file_path(key));
    }

    /// Returns true the first time it is called for this store, then records
    /// the flag so later launches see `false`.
    pub fn first_launch(&self) -> bool {
        match self.get::<bool>(FEATURES_SHOWN_KEY) {
            Ok(Some(true)) => false,
            _ => {
                if let Err(e) = self.set(FEATURES_SHOWN_KEY, &true) {
                    tracing::warn!(error = %e, "could not persist features_shown flag");
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());
        assert_eq!(store.get::<Vec<String>>("k").unwrap(), None);
        store.set("k", &vec!["a".to_string()]).unwrap();
        assert!(store.exists("k"));
        assert_eq!(store.get::<Vec<String>>("k").unwrap(), Some(vec!["a".to_string()]));
        store.remove("k");
        assert!(!store.exists("k"));
    }

    #[test]
    fn corrupt_value_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());
        fs::write(dir.path().join("k.json"), "not json").unwrap();
        assert!(store.get::<bool>("k").is_err());
    }

    #[test]
    fn first_launch_flag() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());
        assert!(store.first_launch());
        assert!(!store.first_launch());
    }
}
