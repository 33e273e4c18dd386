//! Async reader for `tc -s qdisc show dev (whatever)`

use crate::sample::QueueSample;
use std::time::Duration;
use thiserror::Error;
use tlab_utils::{run_with_timeout, ToolError};
use tracing::info;

/// Anything that can produce a fresh [`QueueSample`] on demand.
/// An `Err` means "no data this cycle", never a zeroed sample.
#[allow(async_fn_in_trait)]
pub trait QueueStatsSource {
  /// Take one reading.
  async fn poll(&mut self) -> Result<QueueSample, StatsError>;
}

/// Reads qdisc statistics for one interface by shelling out to `tc`.
#[derive(Debug, Clone)]
pub struct TcStatsReader {
  tc_path: String,
  interface: String,
  timeout: Duration,
}

impl TcStatsReader {
  /// Creates a reader for `interface`. Each `tc` call is killed if it
  /// runs longer than `timeout`.
  pub fn new(tc_path: impl Into<String>, interface: impl Into<String>, timeout: Duration) -> Self {
    Self {
      tc_path: tc_path.into(),
      interface: interface.into(),
      timeout,
    }
  }

  fn args(&self) -> [&str; 5] {
    ["-s", "qdisc", "show", "dev", self.interface.as_str()]
  }

  async fn fetch_raw(&self) -> Result<String, StatsError> {
    let output = run_with_timeout(&self.tc_path, &self.args(), self.timeout)
      .await?
      .require_success(&self.tc_path)?;
    let text = String::from_utf8(output.stdout).map_err(|e| {
      info!("Failed to convert tc output to UTF-8: {e:?}");
      StatsError::Utf8Error
    })?;
    if text.trim().is_empty() {
      return Err(StatsError::EmptyOutput);
    }
    Ok(text)
  }
}

impl QueueStatsSource for TcStatsReader {
  async fn poll(&mut self) -> Result<QueueSample, StatsError> {
    let raw = self.fetch_raw().await?;
    Ok(QueueSample::parse(&raw))
  }
}

/// Reasons a poll produced no sample.
#[derive(Error, Debug)]
pub enum StatsError {
  /// `tc` could not run, timed out, or exited non-zero.
  #[error(transparent)]
  Tool(#[from] ToolError),
  /// The output was not text.
  #[error("Failed to convert tc output to valid UTF-8")]
  Utf8Error,
  /// `tc` succeeded but said nothing.
  #[error("tc produced no output")]
  EmptyOutput,
}

impl StatsError {
  /// True when the `tc` binary itself is missing.
  pub fn is_tool_missing(&self) -> bool {
    matches!(self, StatsError::Tool(e) if e.is_missing())
  }
}
