pub mod cli;
pub mod start;

use std::time::Duration;

use thiserror::Error;

use crate::notify::Urgency;
use crate::threshold::Metric;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{metric} step must be greater than zero")]
    ZeroStep { metric: Metric },
    #[error("polling interval must be greater than zero")]
    ZeroInterval,
}

/// Limits and timing used by the monitor loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Highest acceptable VRAM usage in MiB.
    pub vram_max_mib: u64,
    /// A further warning fires for every step above the maximum.
    pub vram_step_mib: u64,
    /// VRAM capacity in MiB, only used in warning messages.
    pub vram_total_mib: u64,
    pub temperature_max_celsius: u64,
    pub temperature_step_celsius: u64,
    pub interval: Duration,
    pub urgency: Urgency,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            vram_max_mib: 1900,
            vram_step_mib: 100,
            vram_total_mib: 2048,
            temperature_max_celsius: 80,
            temperature_step_celsius: 5,
            interval: Duration::from_secs(2),
            urgency: Urgency::Critical,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vram_step_mib == 0 {
            return Err(ConfigError::ZeroStep {
                metric: Metric::Vram,
            });
        }
        if self.temperature_step_celsius == 0 {
            return Err(ConfigError::ZeroStep {
                metric: Metric::Temperature,
            });
        }
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}

impl TryFrom<&start::StartArgs> for MonitorConfig {
    type Error = ConfigError;

    fn try_from(args: &start::StartArgs) -> Result<Self, Self::Error> {
        let config = Self {
            vram_max_mib: args.max_vram,
            vram_step_mib: args.vram_step,
            vram_total_mib: args.vram_total,
            temperature_max_celsius: args.max_temp,
            temperature_step_celsius: args.temp_step,
            interval: Duration::from_secs(args.interval),
            urgency: args.urgency,
        };
        config.validate()?;
        Ok(config)
    }
}

pub use cli::*;
pub use start::*;
