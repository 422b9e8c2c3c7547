// ⚙️ Configuration - JSON file with defaults for every field

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "TEMPLE_LEDGER_CONFIG";

pub const DEFAULT_ROWS_PER_PAGE: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite document store
    pub database_path: PathBuf,
    /// Where exported reports are written
    pub export_dir: PathBuf,
    /// Rows per page in paged documents
    pub rows_per_page: usize,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: PathBuf::from("temple.db"),
            export_dir: PathBuf::from("exports"),
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file: {:?}", path))?;

        anyhow::ensure!(config.rows_per_page > 0, "rows_per_page must be at least 1");
        Ok(config)
    }

    /// Load `path`, else the file named by `TEMPLE_LEDGER_CONFIG`, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);

        match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load(&path),
            None => {
                debug!("no config file given, using defaults");
                Ok(Self::default())
            }
        }
    }
}
