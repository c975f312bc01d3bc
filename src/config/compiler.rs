use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Configuration parameters for the dynamic template compiler and cache
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CompilerConfig {
    /// Interval (in milliseconds) between fingerprint polls when the
    /// physical file provider watches a template source for changes
    #[serde(default = "default_watch_poll_interval_ms")]
    pub watch_poll_interval_ms: u64,

    /// Upper bound on template source size; larger sources are rejected
    /// with a compilation diagnostic instead of being parsed
    #[serde(default = "default_max_template_bytes")]
    pub max_template_bytes: usize,

    /// When set, unknown tags and attributes are syntax errors.
    /// When unset they are logged and skipped.
    #[serde(default)]
    pub strict_directives: bool,
}

fn default_watch_poll_interval_ms() -> u64 {
    500
}

fn default_max_template_bytes() -> usize {
    1024 * 1024
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            watch_poll_interval_ms: default_watch_poll_interval_ms(),
            max_template_bytes: default_max_template_bytes(),
            strict_directives: false,
        }
    }
}

impl CompilerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.watch_poll_interval_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "watch_poll_interval_ms must be greater than 0".into(),
            )));
        }
        if self.max_template_bytes == 0 {
            return Err(Error::Config(ConfigError::Message(
                "max_template_bytes must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}
