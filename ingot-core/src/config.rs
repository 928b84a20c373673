//! Engine configuration, read from a JSON5 file.

use std::{fs, io, path::Path};

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG: &str = include_str!("../../package-content/ingot_config.json5");

/// Errors raised while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file couldn't be read or written.
    #[error("config file error: {0}")]
    Io(#[from] io::Error),
    /// The file isn't valid JSON5 for the config.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Tunables of the tick engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Seed of the world random source.
    pub seed: u64,
    /// Upper bound on scheduled block ticks run in one game tick.
    pub max_block_ticks_per_tick: usize,
    /// Game ticks the simulation runner advances.
    pub simulation_ticks: u64,
    /// Whether removed containers spill their contents.
    pub drop_contents_on_removal: bool,
}

impl EngineConfig {
    /// Parses a config from JSON5 text and validates it.
    pub fn from_json5(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json5::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the config at `path`, writing the default there first if it is missing.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, DEFAULT_CONFIG)?;
            log::info!("Wrote default config to {}", path.display());
        }
        Self::from_json5(&fs::read_to_string(path)?)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_block_ticks_per_tick == 0 {
            return Err(ConfigError::Invalid(
                "max_block_ticks_per_tick must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_block_ticks_per_tick: 65536,
            simulation_ticks: 200,
            drop_contents_on_removal: true,
        }
    }
}
