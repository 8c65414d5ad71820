use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::SlotwatchError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA zone the grid engine places slot instants in
    pub timezone: String,
    /// Year assumed for dates rendered without one; the current year if unset
    pub reference_year: Option<i32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { timezone: "America/New_York".to_string(), reference_year: None }
    }
}

impl EngineConfig {
    pub fn reference_tz(&self) -> std::result::Result<Tz, SlotwatchError> {
        Tz::from_str(&self.timezone)
            .map_err(|_| SlotwatchError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn year(&self) -> i32 {
        self.reference_year.unwrap_or_else(|| Local::now().year())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl Config {
    /// Load from `path`, or from the platform config file when `path` is `None`.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => get_config_path()?,
        };

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        let config: Config = toml::from_str(&content)
            .map_err(SlotwatchError::from)
            .context("Failed to parse config file")?;
        config.engine.reference_tz()?;
        Ok(config)
    }

    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => get_config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(SlotwatchError::from)?;
        fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(config_path)
    }

    /// Write the default config, refusing to replace an existing file unless `force`.
    pub fn init(path: Option<&Path>, force: bool) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => get_config_path()?,
        };

        if config_path.exists() && !force {
            bail!(
                "Config file {} already exists (use --force to overwrite)",
                config_path.display()
            );
        }

        Config::default().save(Some(&config_path))
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "slotwatch", "slotwatch")
        .context("Failed to determine config directory")?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}
