use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use connection::RetryPolicy;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const INTERNAL_PORT_ENV: &str = "GAUGE_INTERNAL_PORT";
pub const API_PORT_ENV: &str = "GAUGE_API_PORT";
pub const HOST_ENV: &str = "STEPWIRE_HOST";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_CONNECT_ATTEMPTS: u32 = 5;
const DEFAULT_RETRY_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub host: String,
    /// Execution channel port. In listen mode `None` binds an ephemeral port.
    pub internal_port: Option<u16>,
    /// API channel port; the API client is only started when set.
    pub api_port: Option<u16>,
    pub listen: bool,
    pub connect_attempts: u32,
    pub retry_interval_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            internal_port: None,
            api_port: None,
            listen: false,
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
        }
    }
}

impl RunnerConfig {
    /// Defaults, overlaid with `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Overlay values from the environment, read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_ENV) {
            self.host = host;
        }
        if let Some(port) = lookup(INTERNAL_PORT_ENV) {
            self.internal_port = Some(parse_port(INTERNAL_PORT_ENV, &port)?);
        }
        if let Some(port) = lookup(API_PORT_ENV) {
            self.api_port = Some(parse_port(API_PORT_ENV, &port)?);
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.connect_attempts,
            Duration::from_millis(self.retry_interval_ms),
        )
    }
}

fn parse_port(name: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{} is not a valid port: {:?}", name, value))
}
