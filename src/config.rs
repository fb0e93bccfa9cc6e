use crate::storage::connection::{DatabaseConfig, DatabaseLocation, DEFAULT_BUSY_TIMEOUT, DEFAULT_DATABASE_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TrackerConfig {
    pub database: Option<String>,
    pub busy_timeout_ms: Option<u64>,
    pub shared_cache: Option<bool>,
}

impl TrackerConfig {
    /// Connection options, with `database_override` taking precedence over the file
    pub fn database_config(&self, database_override: Option<&Path>) -> DatabaseConfig {
        let path = database_override
            .map(Path::to_path_buf)
            .or_else(|| self.database.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE));

        let mut config = DatabaseConfig::file(path);
        config.busy_timeout = self
            .busy_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BUSY_TIMEOUT);
        if let Some(shared_cache) = self.shared_cache {
            config.shared_cache = shared_cache;
        }
        config
    }

    /// Settings written by `tracker init`
    pub fn with_defaults() -> Self {
        Self {
            database: Some(DEFAULT_DATABASE_FILE.to_string()),
            busy_timeout_ms: Some(DEFAULT_BUSY_TIMEOUT.as_millis() as u64),
            shared_cache: Some(true),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("tracker.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<TrackerConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: TrackerConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &TrackerConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(config: &DatabaseConfig) -> anyhow::Result<()> {
    let DatabaseLocation::File(db_path) = &config.location else {
        return Ok(());
    };
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
