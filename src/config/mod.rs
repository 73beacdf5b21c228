//! Configuration management for hello-parallel
//!
//! Configuration only controls how the thread team is sized. It is layered from
//! embedded defaults, an optional user file, an optional repository file and
//! `HELLO_PARALLEL_` environment variables (see [`ConfigLoader`]).

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod core;

pub use self::core::ConfigLoader;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct HelloConfig {
    /// Thread team configuration
    #[serde(default)]
    pub team: TeamConfig,
}

/// Thread team sizing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TeamConfig {
    /// Fixed team size (0 = let the runtime decide)
    pub num_threads: usize,

    /// Upper bound on the hardware-derived team size (0 = no cap)
    pub max_threads: usize,

    /// Percentage of CPU cores to use when sizing from hardware (1-100)
    pub thread_percentage: u8,

    /// Run regions in parallel; when false every region has a single worker
    pub parallel: bool,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            max_threads: 0,
            thread_percentage: 100,
            parallel: true,
        }
    }
}

impl HelloConfig {
    /// Load the layered configuration (see [`ConfigLoader`])
    pub fn load(custom_config: Option<&str>) -> Result<Self> {
        ConfigLoader::new(custom_config).extract()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.team.thread_percentage) {
            anyhow::bail!(
                "team.thread_percentage must be between 1 and 100, got {}",
                self.team.thread_percentage
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HelloConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.team.parallel);
        assert_eq!(config.team.num_threads, 0);
    }

    #[test]
    fn test_thread_percentage_bounds() {
        let mut config = HelloConfig::default();

        config.team.thread_percentage = 0;
        assert!(config.validate().is_err());

        config.team.thread_percentage = 101;
        assert!(config.validate().is_err());

        config.team.thread_percentage = 1;
        assert!(config.validate().is_ok());
    }
}
