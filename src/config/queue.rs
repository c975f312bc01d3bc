use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Configuration parameters for the deferred work queue consumer
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct QueueConfig {
    /// Emit a progress log line every N drained items
    #[serde(default = "default_drain_log_every")]
    pub drain_log_every: u64,

    /// Grace period (in milliseconds) the consumer waits for an in-flight
    /// item after cancellation is requested
    #[serde(default = "default_consumer_shutdown_grace_ms")]
    pub consumer_shutdown_grace_ms: u64,
}

fn default_drain_log_every() -> u64 {
    100
}

fn default_consumer_shutdown_grace_ms() -> u64 {
    1000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            drain_log_every: default_drain_log_every(),
            consumer_shutdown_grace_ms: default_consumer_shutdown_grace_ms(),
        }
    }
}

impl QueueConfig {
    pub fn validate(&self) -> Result<()> {
        if self.drain_log_every == 0 {
            return Err(Error::Config(ConfigError::Message(
                "drain_log_every must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}
