//! Watches the queueing discipline on one interface while traffic flows.
//! Polls `tc -s qdisc show dev <interface>` on a fixed interval, keeps a
//! session-relative drop counter that the operator can zero by typing
//! `clear`, and redraws a single status line in place.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
mod command_channel;
mod monitor;
mod reader;
mod render;
mod sample;
mod session_counter;

pub use command_channel::{CommandSource, OperatorCommand, StdinCommandChannel};
pub use monitor::{
  run_queue_monitor, shutdown_signal, MonitorError, MonitorSettings, MonitorState,
  QueueMonitor,
};
pub use reader::{QueueStatsSource, StatsError, TcStatsReader};
pub use render::{write_header, StatusLine, StatusRow};
pub use sample::QueueSample;
pub use session_counter::{CounterAnomaly, SessionCounter};
