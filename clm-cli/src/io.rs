//! File I/O for native CLI

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use clm_core::{App, ClmError, Config, KeyValueStore};

/// Get the ~/.clm directory path, creating it if needed
pub fn clm_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    let clm_dir = home.join(".clm");

    if !clm_dir.exists() {
        fs::create_dir_all(&clm_dir)
            .with_context(|| format!("Failed to create {}", clm_dir.display()))?;
    }

    Ok(clm_dir)
}

/// Load `$CLM_CONFIG`, or `~/.clm/config.toml`. A missing file means
/// defaults.
pub fn load_config() -> Result<Config> {
    let path = match std::env::var_os("CLM_CONFIG") {
        Some(path) => PathBuf::from(path),
        None => clm_dir()?.join("config.toml"),
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Config::from_toml_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
}

/// Key/value store persisted as one JSON object. Stands in for the
/// browser's local storage.
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open `~/.clm/local.json`. An unreadable file starts empty.
    pub fn open() -> Result<Self> {
        let path = clm_dir()?.join("local.json");
        let values = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Ok(Self { path, values })
    }

    fn flush(&self) -> clm_core::Result<()> {
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, json)
            .map_err(|e| ClmError::Storage(format!("{}: {}", self.path.display(), e)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> clm_core::Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> clm_core::Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> clm_core::Result<()> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Export the session to ~/.clm/session.json
pub fn export_session(app: &App) -> Result<PathBuf> {
    let export_path = clm_dir()?.join("session.json");

    let json = clm_core::to_json(app).context("Failed to serialize session")?;

    fs::write(&export_path, json)
        .with_context(|| format!("Failed to write {}", export_path.display()))?;

    info!(path = %export_path.display(), "session exported");
    Ok(export_path)
}
