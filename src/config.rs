use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::alerts::{DEFAULT_ALERT_THRESHOLD, DEFAULT_PUMPING_THRESHOLD};
use crate::error::WatchError;

pub const DEFAULT_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_PORT_START: u16 = 5000;
pub const DEFAULT_PORT_END: u16 = 5100;

/// Runtime settings. Read from `GMGN_*` environment variables, then
/// overridden by command-line flags in `main`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding `latest.json` and the history files.
    pub data_dir: PathBuf,
    /// Alerts fire for `change_24h` strictly above this.
    pub alert_threshold: f64,
    /// Dashboard "pumping" stat counts `change_24h` strictly above this.
    pub pumping_threshold: f64,
    pub interval: Duration,
    pub bind: String,
    pub port_start: u16,
    pub port_end: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            pumping_threshold: DEFAULT_PUMPING_THRESHOLD,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            bind: "0.0.0.0".to_string(),
            port_start: DEFAULT_PORT_START,
            port_end: DEFAULT_PORT_END,
        }
    }
}

fn env_str(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>, WatchError> {
    match env_str(name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| WatchError::Config(format!("{} has an invalid value: {}", name, raw))),
        None => Ok(None),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, WatchError> {
        let defaults = Self::default();
        let config = Self {
            data_dir: env_str("GMGN_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            alert_threshold: env_parse("GMGN_ALERT_THRESHOLD")?
                .unwrap_or(defaults.alert_threshold),
            pumping_threshold: env_parse("GMGN_PUMPING_THRESHOLD")?
                .unwrap_or(defaults.pumping_threshold),
            interval: env_parse("GMGN_INTERVAL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            bind: env_str("GMGN_BIND").unwrap_or(defaults.bind),
            port_start: env_parse("GMGN_PORT_START")?.unwrap_or(defaults.port_start),
            port_end: env_parse("GMGN_PORT_END")?.unwrap_or(defaults.port_end),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WatchError> {
        if self.port_start > self.port_end {
            return Err(WatchError::Config(format!(
                "port range {}-{} is empty",
                self.port_start, self.port_end
            )));
        }
        if self.interval.is_zero() {
            return Err(WatchError::Config("interval must be positive".to_string()));
        }
        if !self.alert_threshold.is_finite() || !self.pumping_threshold.is_finite() {
            return Err(WatchError::Config("thresholds must be finite".to_string()));
        }
        Ok(())
    }

    pub fn port_range(&self) -> RangeInclusive<u16> {
        self.port_start..=self.port_end
    }
}
