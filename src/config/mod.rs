//! Configuration management for the page lifecycle engine.
//!
//! Provides configuration loading from multiple sources with priority:
//! 1. Default values (hardcoded)
//! 2. Optional TOML config file
//! 3. Environment variables (highest priority)

mod compiler;
mod queue;
mod validation;

pub use compiler::*;
pub use queue::*;
pub use validation::*;

#[cfg(test)]
mod config_test;

//---
use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Template compilation and cache settings
    #[serde(default)]
    pub compiler: CompilerConfig,
    /// Deferred work queue settings
    #[serde(default)]
    pub queue: QueueConfig,
    /// Validator protocol settings
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl Settings {
    /// Load configuration with priority:
    /// 1. Hardcoded defaults
    /// 2. Optional config file
    /// 3. Environment variables (`PAGELIFT__` prefix, `__` separator)
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a TOML configuration file
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder();

        if let Some(path) = config_path {
            config = config.add_source(File::with_name(path).required(true));
        }

        config = config.add_source(
            Environment::with_prefix("PAGELIFT")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Settings = config.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates all subsystem configurations
    pub fn validate(&self) -> Result<()> {
        self.compiler.validate()?;
        self.queue.validate()?;
        self.validation.validate()?;
        Ok(())
    }
}
