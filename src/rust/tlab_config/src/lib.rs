//! Manages the `/etc/tlab.conf` file, shared by every tlab tool.
//! The file is optional: every key has a default, and the command line
//! overrides whatever the file says.

#![warn(missing_docs)]
mod etc;

pub use etc::{
  load_config_from, Config, ConfigError, MonitorConfig,
  TrafficConfig, CONFIG_ENV, DEFAULT_CONFIG_PATH,
};
