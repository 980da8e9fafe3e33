use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::CliArgs;

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_EVENTS_PATH: &str = "/events";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Config {
    pub version: u32,
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ServerConfig {
    pub base_url: String,
    #[serde(default = "default_events_path")]
    pub events_path: String,
}

/// Where the theme preference lives. `None` means `~/.activity-feed`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct StorageConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LoggingConfig {
    pub filter: String,
}

fn default_events_path() -> String {
    DEFAULT_EVENTS_PATH.to_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            events_path: default_events_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

pub fn get_default_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "activity-feed")
        .context("Failed to determine project directories")?;

    Ok(proj_dirs.config_dir().join("activity-feed.toml"))
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p,
            None => get_default_config_path()?,
        };

        if !path.exists() {
            let default_config = Config::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
            default_config.save(&path)?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&path, contents).with_context(|| {
            format!("Failed to write config file: {}", path.as_ref().display())
        })?;

        Ok(())
    }

    pub fn from_cli_and_file(cli_args: CliArgs) -> Result<Self> {
        let mut config = Self::load(cli_args.config)?;

        // CLI args override config file
        if let Some(server) = cli_args.server {
            config.server.base_url = server;
        }

        Ok(config)
    }
}
