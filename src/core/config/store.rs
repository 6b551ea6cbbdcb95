use std::path::{Path, PathBuf};

use crate::core::config::data::Config;

/// Owns the location of the config file; all reads and writes go through it.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The platform config location.
    pub fn platform() -> Result<Self, Box<dyn std::error::Error>> {
        Config::get_config_path()
            .map(Self::new)
            .ok_or_else(|| "Failed to determine config directory".into())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config, Box<dyn std::error::Error>> {
        Ok(Config::load_from_path(&self.path)?)
    }

    /// Load, edit and persist in one step.
    pub fn mutate<F, T>(&self, mutator: F) -> Result<T, Box<dyn std::error::Error>>
    where
        F: FnOnce(&mut Config) -> Result<T, Box<dyn std::error::Error>>,
    {
        let mut working = self.load()?;
        let result = mutator(&mut working)?;
        working.save_to_path(&self.path)?;
        Ok(result)
    }
}
