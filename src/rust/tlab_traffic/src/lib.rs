//! Thin wrappers around `iperf3`: a client that generates TCP traffic and
//! decodes the JSON report, and a server that receives it.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
mod generator;
mod receiver;
mod report;
#[cfg(test)]
mod test_data;

pub use generator::{run_generator, GeneratorRequest};
pub use receiver::{run_receiver, ReceiverOutcome, ReceiverRequest};
pub use report::{ReceivedTotals, StreamRtt, TrafficReport};

use thiserror::Error;

/// Suggested fix when `iperf3` is missing.
pub const IPERF_INSTALL_HINT: &str = "Please install it (e.g., 'sudo apt install iperf3').";

/// Failures driving `iperf3`.
#[derive(Debug, Error)]
pub enum TrafficError {
  /// The bandwidth tool is not installed.
  #[error("{tool} not found. {}", IPERF_INSTALL_HINT)]
  ToolMissing {
    /// Name or path of the tool
    tool: String,
  },
  /// The tool ran and reported failure, or could not be run to completion.
  #[error("Error running {tool}: {message}")]
  ToolFailed {
    /// Name or path of the tool
    tool: String,
    /// What the tool said went wrong
    message: String,
  },
  /// The tool exited cleanly but its JSON could not be decoded.
  #[error("Error parsing iperf3 JSON output: {0}")]
  MalformedReport(String),
  /// Local I/O failure
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}
