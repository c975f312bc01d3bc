use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Configuration parameters for the validator protocol
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ValidationConfig {
    /// Emit declarative client-echo attributes for uplevel validators
    #[serde(default = "default_client_echo_enabled")]
    pub client_echo_enabled: bool,

    /// Attribute name prefix used for the client-side validation mirror
    #[serde(default = "default_unobtrusive_prefix")]
    pub unobtrusive_prefix: String,
}

fn default_client_echo_enabled() -> bool {
    true
}

fn default_unobtrusive_prefix() -> String {
    "data-val-".to_string()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            client_echo_enabled: default_client_echo_enabled(),
            unobtrusive_prefix: default_unobtrusive_prefix(),
        }
    }
}

impl ValidationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.client_echo_enabled && self.unobtrusive_prefix.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "unobtrusive_prefix must not be empty when client echo is enabled".into(),
            )));
        }
        Ok(())
    }
}
