//! Runtime-tunable engine configuration.
//!
//! Mirrors `pipeline_server::config::ServerConfig`: a `serde`-deserializable
//! struct with `#[serde(default = "...")]` fallbacks for every field, loaded
//! from YAML via `serde_yaml`. This crate's only runtime-tunable policy is
//! the retry behavior the spec calls out by name (§4.5): `MaxAttempts` and
//! `BaseDelay`.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

const fn default_max_attempts() -> u32 {
    3
}

const fn default_base_delay_ms() -> u64 {
    50
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// At most this many attempts per mutating command before returning
    /// `Error::Unrecoverable`. Spec default: 3.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base of the exponential backoff between retries:
    /// `base_delay * 2^(attempt-1)`. Spec default: 50ms.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl EngineConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// `base_delay * 2^(attempt-1)` for `attempt` in `1..=max_attempts`.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(31);
        self.base_delay() * 2u32.saturating_pow(shift)
    }

    pub fn from_yaml_str(s: &str) -> anyhow::Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(s)?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow::anyhow!("failed to read engine config '{}': {e}", path.as_ref().display())
        })?;
        Self::from_yaml_str(&contents)
    }
}
