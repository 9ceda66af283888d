use crate::error::{BrokerError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Capacity of the inbound request channel the CLI feeds the broker through.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Runtime settings for a [`Broker`](crate::application::broker::Broker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    /// How long a single handler may take before its opinion is discarded.
    /// `None` waits forever.
    pub handler_timeout: Option<Duration>,
    pub channel_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            handler_timeout: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// On-disk shape of the configuration file.
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    handler_timeout_ms: Option<u64>,
    channel_capacity: Option<usize>,
}

impl BrokerConfig {
    /// Parses a JSON configuration document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(json)?;
        let defaults = Self::default();
        let config = Self {
            handler_timeout: file.handler_timeout_ms.map(Duration::from_millis),
            channel_capacity: file.channel_capacity.unwrap_or(defaults.channel_capacity),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(BrokerError::ConfigError(
                "channel_capacity must be greater than zero".to_string(),
            ));
        }
        if self.handler_timeout == Some(Duration::ZERO) {
            return Err(BrokerError::ConfigError(
                "handler_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
