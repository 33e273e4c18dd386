//! Top-level configuration file for the tlab tools.

mod monitor;
mod traffic;

pub use monitor::MonitorConfig;
pub use traffic::TrafficConfig;

use serde::Deserialize;
use std::{
  path::{Path, PathBuf},
  time::Duration,
};
use thiserror::Error;
use tracing::{debug, info};

/// Where the configuration lives unless told otherwise.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/tlab.conf";

/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_ENV: &str = "TLAB_CONFIG";

/// Top-level configuration file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
  /// Live queue monitor settings
  pub monitor: MonitorConfig,

  /// Traffic generator/receiver settings
  pub traffic: TrafficConfig,
}

impl Config {
  /// Test if a configuration is usable.
  pub fn validate(&self) -> Result<(), String> {
    let interval = self.monitor.interval_seconds;
    if !matches!(Duration::try_from_secs_f64(interval), Ok(d) if !d.is_zero()) {
      return Err(format!(
        "monitor.interval_seconds must be a positive number of seconds, not {interval}"
      ));
    }
    if self.monitor.command_timeout_ms == 0 {
      return Err("monitor.command_timeout_ms must be greater than zero".to_string());
    }
    if self.monitor.tc_path.trim().is_empty() {
      return Err("monitor.tc_path cannot be empty".to_string());
    }
    if let Some(interface) = &self.monitor.interface {
      if interface.trim().is_empty() {
        return Err("monitor.interface cannot be an empty string".to_string());
      }
    }
    if self.traffic.iperf_path.trim().is_empty() {
      return Err("traffic.iperf_path cannot be empty".to_string());
    }
    if self.traffic.port == 0 {
      return Err("traffic.port must be between 1 and 65535".to_string());
    }
    if self.traffic.parallel == 0 {
      return Err("traffic.parallel must be at least 1".to_string());
    }
    Ok(())
  }

  /// Parses and validates a configuration from TOML text.
  pub fn load_from_string(s: &str) -> Result<Self, ConfigError> {
    let config: Config = toml_edit::de::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate().map_err(ConfigError::Invalid)?;
    Ok(config)
  }
}

/// Loads the configuration from `path` if given, otherwise from
/// `$TLAB_CONFIG` or `/etc/tlab.conf`. An explicitly named file (by
/// argument or environment) must exist. A missing default file is not
/// an error: defaults are used instead.
pub fn load_config_from(path: Option<&Path>) -> Result<Config, ConfigError> {
  let (path, explicit) = match path {
    Some(p) => (p.to_path_buf(), true),
    None => match std::env::var_os(CONFIG_ENV) {
      Some(p) => (PathBuf::from(p), true),
      None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    },
  };

  if !path.exists() {
    if explicit {
      return Err(ConfigError::NotFound(path));
    }
    debug!("No configuration at {}, using defaults", path.display());
    return Ok(Config::default());
  }

  info!("Loading configuration from {}", path.display());
  let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(path.clone(), e))?;
  Config::load_from_string(&raw)
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// A file was explicitly requested but isn't there.
  #[error("Configuration file {0} does not exist")]
  NotFound(PathBuf),
  /// The file exists but could not be read.
  #[error("Unable to read {0}: {1}")]
  Io(PathBuf, #[source] std::io::Error),
  /// The file is not valid TOML for this schema.
  #[error("Error parsing config: {0}")]
  Parse(String),
  /// The file parsed, but the values are unusable.
  #[error("Invalid configuration: {0}")]
  Invalid(String),
}
