use thiserror::Error;
use tracing::warn;

/// Re-bases the kernel's cumulative drop counter so that the operator
/// only sees drops since the session (or the last `clear`) began.
///
/// The displayed value is always derived from the latest cumulative
/// reading; nothing is accumulated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCounter {
  offset: u64,
  last_observed: u64,
}

impl SessionCounter {
  /// Starts a session at `initial_cumulative`, so the first displayed
  /// value is zero whatever the qdisc's history.
  pub fn initialize(initial_cumulative: u64) -> Self {
    Self { offset: initial_cumulative, last_observed: initial_cumulative }
  }

  /// Current zero point.
  pub fn offset(&self) -> u64 {
    self.offset
  }

  /// Most recent cumulative reading passed to [`Self::observe`], or the
  /// bootstrap value if there hasn't been one.
  pub fn last_observed(&self) -> u64 {
    self.last_observed
  }

  /// Moves the zero point to `current_cumulative`.
  pub fn reset(&mut self, current_cumulative: u64) {
    self.offset = current_cumulative;
  }

  /// Drops since the zero point. Fails if the cumulative counter has
  /// gone backwards past the zero point.
  pub fn displayed(&self, current_cumulative: u64) -> Result<u64, CounterAnomaly> {
    current_cumulative
      .checked_sub(self.offset)
      .ok_or(CounterAnomaly { offset: self.offset, cumulative: current_cumulative })
  }

  /// Records a new cumulative reading and returns the value to display.
  /// A counter that went backwards (the qdisc was replaced or reset
  /// underneath us) re-seeds the zero point and displays zero.
  pub fn observe(&mut self, current_cumulative: u64) -> u64 {
    self.last_observed = current_cumulative;
    match self.displayed(current_cumulative) {
      Ok(n) => n,
      Err(anomaly) => {
        warn!("{anomaly}. Re-seeding the session drop counter.");
        self.reset(current_cumulative);
        0
      }
    }
  }
}

/// The kernel's cumulative drop count fell below the session offset.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Cumulative drop counter went backwards ({cumulative} < offset {offset})")]
pub struct CounterAnomaly {
  /// Offset in force at the time
  pub offset: u64,
  /// The cumulative value that was read
  pub cumulative: u64,
}
