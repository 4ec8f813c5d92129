use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DedupError, Result};

/// Root application configuration, loaded from `~/.config/contact-dedup/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub dedup: DedupConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Allow deleting duplicates owned by a sync account.
    pub bypass_sync_restriction: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("contact-dedup");
        Self {
            data_dir: data_dir.to_string_lossy().to_string(),
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            bypass_sync_restriction: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/contact-dedup/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("CONTACT_DEDUP_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("contact-dedup")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.core.data_dir.trim().is_empty() {
            return Err(DedupError::ConfigError("core.data_dir must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn set_data_dir(&mut self, path: PathBuf) {
        self.core.data_dir = path.to_string_lossy().to_string();
    }

    // ─── Derived paths ─────────────────────────────────────

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.core.data_dir)
    }

    /// Path to the SQLite contact database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("contacts.db")
    }
}
