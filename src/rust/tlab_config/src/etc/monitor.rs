//! `[monitor]` section: the live queue monitor.

use serde::Deserialize;

/// Settings for `tlab monitor`.
#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
  /// Interface whose root qdisc is watched. Usually given on the
  /// command line instead.
  pub interface: Option<String>,

  /// Refresh interval, in (fractional) seconds.
  pub interval_seconds: f64,

  /// Path to (or name of) the `tc` binary.
  pub tc_path: String,

  /// How long a single `tc` invocation may take before it is killed
  /// and the cycle is skipped. In ms.
  pub command_timeout_ms: u64,
}

impl Default for MonitorConfig {
  fn default() -> Self {
    Self {
      interface: None,
      interval_seconds: 0.5,
      tc_path: "tc".to_string(),
      command_timeout_ms: 1000,
    }
  }
}
