//! Application configuration.
//!
//! Values come from built-in defaults, then `config.toml` under the
//! user's config directory, then `ROUTEBOOK_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::FileStore;

/// Base URL of the routes API.
pub const DEFAULT_API_URL: &str = "https://692321e909df4a49232469c2.mockapi.io";
/// Directory under `~/.config` holding `config.toml`.
pub const CONFIG_DIR: &str = "routebook";
const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "ROUTEBOOK";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Runtime settings shared by the core and the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the routes API; `/routes` is appended.
    pub api_url: String,
    /// Directory used by the file-backed key-value store.
    pub storage_root: PathBuf,
    /// Timeout applied to every HTTP request.
    pub request_timeout_secs: u64,
    /// Start the frontend with the dark palette.
    pub dark_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_root: FileStore::default_root(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            dark_mode: false,
        }
    }
}

impl AppConfig {
    /// Load from the default config file and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from `path` (optional on disk) layered with the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("api_url", defaults.api_url)?
            .set_default(
                "storage_root",
                defaults.storage_root.to_string_lossy().to_string(),
            )?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("dark_mode", defaults.dark_mode)?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        settings
            .try_deserialize()
            .context("failed to parse configuration")
    }
}

/// Location of `config.toml`.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write a default config file on first run. Returns its path.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    ensure_default_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path` unless one already exists.
pub fn ensure_default_config_at(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, default_config_contents(&AppConfig::default()))
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

fn default_config_contents(config: &AppConfig) -> String {
    format!(
        "# Routebook configuration\n\
         api_url = {}\n\
         storage_root = {}\n\
         request_timeout_secs = {}\n\
         dark_mode = {}\n",
        toml_string(&config.api_url),
        toml_string(&config.storage_root.to_string_lossy()),
        config.request_timeout_secs,
        config.dark_mode,
    )
}

/// Render `value` as a TOML basic string.
fn toml_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_url = \"http://localhost:9000\"\nstorage_root = '/tmp/routebook'\ndark_mode = true\n",
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.storage_root, PathBuf::from("/tmp/routebook"));
        assert!(config.dark_mode);
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        Ok(())
    }

    #[test]
    fn default_file_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("routebook").join("config.toml");
        ensure_default_config_at(&path)?;
        assert!(path.is_file());

        let loaded = AppConfig::load_from(&path)?;
        assert_eq!(loaded.api_url, DEFAULT_API_URL);
        assert_eq!(loaded.storage_root, FileStore::default_root());

        fs::write(&path, "dark_mode = true\n")?;
        ensure_default_config_at(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "dark_mode = true\n");
        Ok(())
    }

    #[test]
    fn template_escapes_awkward_storage_paths() -> Result<()> {
        let dir = tempdir()?;
        let storage_root = dir.path().join("it's \"here\"\\data");
        let config = AppConfig {
            storage_root: storage_root.clone(),
            ..AppConfig::default()
        };
        let path = dir.path().join("config.toml");
        fs::write(&path, default_config_contents(&config))?;

        let loaded = AppConfig::load_from(&path)?;
        assert_eq!(loaded.storage_root, storage_root);
        assert_eq!(loaded.api_url, DEFAULT_API_URL);
        Ok(())
    }
}
