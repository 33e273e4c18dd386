//! `[traffic]` section: defaults for the iperf3 sender and receiver.

use serde::Deserialize;

/// Settings for `tlab send` and `tlab receive`.
#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct TrafficConfig {
  /// Path to (or name of) the `iperf3` binary.
  pub iperf_path: String,

  /// Port the receiver listens on and the sender connects to.
  pub port: u16,

  /// Test length in seconds
  pub duration_seconds: u32,

  /// TCP congestion control algorithm requested by the sender.
  pub congestion: String,

  /// Number of parallel streams
  pub parallel: u32,
}

impl Default for TrafficConfig {
  fn default() -> Self {
    Self {
      iperf_path: "iperf3".to_string(),
      port: 5001,
      duration_seconds: 10,
      congestion: "cubic".to_string(),
      parallel: 1,
    }
  }
}
