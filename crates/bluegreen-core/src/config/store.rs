//! Config store for locating and loading bluegreen.toml.

use std::path::{Path, PathBuf};

use super::{Config, ConfigFile, parser};

pub const CONFIG_FILE_NAME: &str = "bluegreen.toml";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store at `<config dir>/bluegreen/bluegreen.toml`.
    pub fn from_default_location() -> anyhow::Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("bluegreen");
        Ok(Self::from_path(config_dir.join(CONFIG_FILE_NAME)))
    }

    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Parse the config file. A missing file yields no environments.
    pub fn load_file(&self) -> anyhow::Result<ConfigFile> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "config file not found");
            return Ok(ConfigFile::default());
        }
        parser::parse_config_toml(&self.config_path)
    }

    /// Load the config file and resolve credentials through `lookup`.
    pub fn load(&self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let file = self.load_file()?;
        Config::new(lookup, file)
    }

    /// Load using the process environment for credentials.
    pub fn load_from_env(&self) -> anyhow::Result<Config> {
        self.load(|name| std::env::var(name).ok())
    }
}
