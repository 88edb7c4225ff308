use crate::{
    Endpoint, DEFAULT_MAX_PERCENT, DEFAULT_MIN_PERCENT, DEFAULT_POLL_INTERVAL, DEFAULT_WORKERS,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Invalid run configuration. Always fatal and raised before any dispatch starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("at least 2 endpoints are required to partition load, got {0}")]
    TooFewEndpoints(usize),

    #[error("{name} must lie within [0, 1], got {value}")]
    PercentOutOfRange { name: &'static str, value: f64 },

    #[error("min_percent ({min}) is greater than max_percent ({max})")]
    InvertedBand { min: f64, max: f64 },

    #[error("infeasible band: 2 * max_percent ({max}) must be below 1.0")]
    InfeasibleBand { max: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("unable to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to parse config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

/// Share band each endpoint (except the last) draws its transaction count from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitionBand {
    pub min_percent: f64,
    pub max_percent: f64,
}

impl Default for PartitionBand {
    fn default() -> Self {
        Self {
            min_percent: DEFAULT_MIN_PERCENT,
            max_percent: DEFAULT_MAX_PERCENT,
        }
    }
}

impl PartitionBand {
    pub fn new(min_percent: f64, max_percent: f64) -> Result<Self, ConfigError> {
        let band = Self {
            min_percent,
            max_percent,
        };
        band.validate()?;
        Ok(band)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("min_percent", self.min_percent),
            ("max_percent", self.max_percent),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::PercentOutOfRange { name, value });
            }
        }

        if self.min_percent > self.max_percent {
            return Err(ConfigError::InvertedBand {
                min: self.min_percent,
                max: self.max_percent,
            });
        }

        if 2. * self.max_percent >= 1. {
            return Err(ConfigError::InfeasibleBand {
                max: self.max_percent,
            });
        }

        Ok(())
    }

    /// Integer bounds of a single draw for the given total.
    pub fn bounds(&self, total: u64) -> (u64, u64) {
        let lo = (total as f64 * self.min_percent).floor() as u64;
        let hi = (total as f64 * self.max_percent).floor() as u64;
        (lo, hi)
    }
}

/// Everything a run needs, handed explicitly to the partitioner, dispatcher and reporter.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    pub total: u64,
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub band: PartitionBand,
    pub seed: Option<u64>,
    #[serde(default = "default_workers")]
    pub workers: NonZeroUsize,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    pub confirm_timeout: Option<Duration>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    pub submit_timeout: Option<Duration>,
    #[serde(default)]
    pub show_raw: bool,
}

impl RunConfig {
    pub fn new(total: u64, endpoints: Vec<Endpoint>) -> Self {
        Self {
            total,
            endpoints,
            band: PartitionBand::default(),
            seed: None,
            workers: DEFAULT_WORKERS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirm_timeout: None,
            submit_timeout: None,
            show_raw: false,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let contents = std::fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.len() < 2 {
            return Err(ConfigError::TooFewEndpoints(self.endpoints.len()));
        }
        self.band.validate()
    }
}

fn default_workers() -> NonZeroUsize {
    DEFAULT_WORKERS
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}
