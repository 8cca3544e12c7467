use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use panacea::stats::DEFAULT_ENDPOINT;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct StatsConfig {
    pub(crate) endpoint: String,
    pub(crate) grace_ms: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            grace_ms: 2000,
        }
    }
}

impl StatsConfig {
    pub(crate) fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub(crate) questions: Option<PathBuf>,
    pub(crate) answers_file: PathBuf,
    pub(crate) rails: String,
    pub(crate) stats: StatsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            questions: None,
            answers_file: PathBuf::from(".panacea"),
            rails: String::from("rails"),
            stats: StatsConfig::default(),
        }
    }
}

impl Config {
    pub(crate) fn default_path() -> Result<PathBuf> {
        let home = home::home_dir().context("failed to locate user home directory")?;
        Ok(home.join(".panacea.config.toml"))
    }

    /// Reads the config at `path`, writing the defaults there first if missing.
    pub(crate) fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = if !path.exists() {
            let config = Self::default();
            let contents = toml::to_string_pretty(&config)?;
            fs::write(path, contents)
                .context(format!("failed to write config: {}", path.display()))?;
            config
        } else {
            let contents = fs::read_to_string(path)
                .context(format!("failed to read config: {}", path.display()))?;
            toml::from_str(&contents)
                .context(format!("failed to parse config: {}", path.display()))?
        };
        Ok(config)
    }
}
