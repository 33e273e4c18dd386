use crate::{
  command_channel::{CommandSource, OperatorCommand, StdinCommandChannel},
  reader::{QueueStatsSource, StatsError, TcStatsReader},
  render::{write_header, StatusLine, StatusRow},
  session_counter::SessionCounter,
};
use std::{
  future::Future,
  io::{IsTerminal, Write},
  time::Duration,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Where the monitor is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
  /// Header not yet printed, offset not yet seeded.
  Bootstrapping,
  /// Sampling on every interval.
  Running,
  /// Interrupted. There is no way back.
  Stopped,
}

/// Everything needed to watch one interface.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
  /// Interface to watch
  pub interface: String,
  /// Time between samples
  pub interval: Duration,
  /// `tc` binary
  pub tc_path: String,
  /// Upper bound on a single `tc` call
  pub command_timeout: Duration,
}

/// The sampling loop. Owns every piece of mutable state: the session
/// counter, the status row and the output.
pub struct QueueMonitor<S, C, W> {
  interface: String,
  interval: Duration,
  source: S,
  commands: C,
  out: W,
  status: StatusLine,
  counter: SessionCounter,
  state: MonitorState,
}

impl<S: QueueStatsSource, C: CommandSource, W: Write> QueueMonitor<S, C, W> {
  /// Builds a monitor that has not yet bootstrapped.
  pub fn new(
    interface: impl Into<String>,
    interval: Duration,
    source: S,
    commands: C,
    out: W,
    status: StatusLine,
  ) -> Self {
    Self {
      interface: interface.into(),
      interval,
      source,
      commands,
      out,
      status,
      counter: SessionCounter::initialize(0),
      state: MonitorState::Bootstrapping,
    }
  }

  /// Current lifecycle state
  pub fn state(&self) -> MonitorState {
    self.state
  }

  /// The session counter as it stands
  pub fn counter(&self) -> &SessionCounter {
    &self.counter
  }

  /// The status row renderer
  pub fn status(&self) -> &StatusLine {
    &self.status
  }

  /// Everything written so far
  pub fn output(&self) -> &W {
    &self.out
  }

  /// Prints the header and seeds the drop offset from a single poll, so
  /// the first displayed value is zero. An unavailable first poll seeds
  /// zero. Only a missing `tc` binary is fatal.
  pub async fn bootstrap(&mut self) -> Result<(), MonitorError> {
    write_header(&mut self.out, &self.interface)?;
    let initial = match self.source.poll().await {
      Ok(sample) => sample.dropped_total,
      Err(e) if e.is_tool_missing() => return Err(MonitorError::ToolMissing(e)),
      Err(e) => {
        info!("Initial poll of {} failed ({e}); starting the drop offset at 0", self.interface);
        0
      }
    };
    self.counter = SessionCounter::initialize(initial);
    self.state = MonitorState::Running;
    info!("Queue monitor running on {}, drop offset {initial}", self.interface);
    Ok(())
  }

  /// One pass: act on every operator line already waiting, take a
  /// sample, redraw. Returns the row drawn, or `None` when there was no
  /// data this cycle and the previous row was left alone.
  pub async fn cycle(&mut self) -> Option<StatusRow> {
    while let Some(line) = self.commands.try_read_line() {
      if let Err(e) = self.status.absorb_input_line(&mut self.out, &line) {
        warn!("Unable to tidy operator input line: {e:?}");
      }
      match OperatorCommand::parse(&line) {
        Some(OperatorCommand::Clear) => {
          let latest = self.counter.last_observed();
          self.counter.reset(latest);
          info!("Session drop counter reset at cumulative {latest}");
        }
        None => debug!("Ignoring operator input {:?}", line.trim()),
      }
    }

    let sample = match self.source.poll().await {
      Ok(sample) => sample,
      Err(e) => {
        debug!("No queue data this cycle: {e}");
        return None;
      }
    };

    let drops = self.counter.observe(sample.dropped_total);
    let row = StatusRow::now(sample.backlog_packets, drops);
    if let Err(e) = self.status.redraw(&mut self.out, &row) {
      warn!("Unable to redraw status line: {e:?}");
      return None;
    }
    Some(row)
  }

  /// Cycles until `shutdown` resolves, then prints the stop notice.
  /// Redraws contain no await points, so an interrupt always lands
  /// between complete redraws. `shutdown` is polled before the first
  /// `tc` call, so an interrupt during bootstrap also stops cleanly.
  pub async fn run<F: Future<Output = ()>>(&mut self, shutdown: F) -> Result<(), MonitorError> {
    tokio::pin!(shutdown);
    if self.state == MonitorState::Bootstrapping {
      tokio::select! {
        biased;
        _ = &mut shutdown => self.state = MonitorState::Stopped,
        result = self.bootstrap() => result?,
      }
    }
    while self.state == MonitorState::Running {
      tokio::select! {
        biased;
        _ = &mut shutdown => self.state = MonitorState::Stopped,
        _ = self.cycle() => {}
      }
      if self.state != MonitorState::Running {
        break;
      }
      tokio::select! {
        biased;
        _ = &mut shutdown => self.state = MonitorState::Stopped,
        _ = tokio::time::sleep(self.interval) => {}
      }
    }
    writeln!(self.out, "\n[*] Stopped.")?;
    self.out.flush()?;
    Ok(())
  }
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM.
pub async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      warn!("Unable to listen for Ctrl+C: {e:?}");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        warn!("Unable to listen for SIGTERM: {e:?}");
        std::future::pending::<()>().await;
      }
    }
  };
  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => info!("Terminating on SIGINT"),
    _ = terminate => info!("Terminating on SIGTERM"),
  }
}

/// Runs the monitor against the real `tc`, stdin and stdout until the
/// operator interrupts it.
pub async fn run_queue_monitor(settings: MonitorSettings) -> Result<(), MonitorError> {
  let reader = TcStatsReader::new(
    settings.tc_path.as_str(),
    settings.interface.as_str(),
    settings.command_timeout,
  );
  let commands = StdinCommandChannel::spawn()?;
  let status = StatusLine::new(std::io::stdin().is_terminal());
  let mut monitor = QueueMonitor::new(
    settings.interface,
    settings.interval,
    reader,
    commands,
    std::io::stdout(),
    status,
  );
  monitor.run(shutdown_signal()).await
}

/// Conditions that end the monitor abnormally.
#[derive(Error, Debug)]
pub enum MonitorError {
  /// `tc` is not installed.
  #[error("Unable to read queue statistics")]
  ToolMissing(#[source] StatsError),
  /// The terminal could not be written.
  #[error("Terminal I/O error")]
  Io(#[from] std::io::Error),
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::sample::QueueSample;
  use std::collections::VecDeque;
  use tlab_utils::ToolError;

  struct ScriptedStats {
    polls: VecDeque<Result<QueueSample, StatsError>>,
  }

  impl ScriptedStats {
    fn drops(values: &[u64]) -> Self {
      Self {
        polls: values
          .iter()
          .map(|d| Ok(QueueSample { dropped_total: *d, backlog_packets: d % 7, backlog_bytes: 0 }))
          .collect(),
      }
    }
  }

  impl QueueStatsSource for ScriptedStats {
    async fn poll(&mut self) -> Result<QueueSample, StatsError> {
      self.polls.pop_front().unwrap_or(Err(StatsError::EmptyOutput))
    }
  }

  #[derive(Default)]
  struct ScriptedCommands {
    per_cycle: VecDeque<Option<String>>,
  }

  impl ScriptedCommands {
    fn with(lines: &[Option<&str>]) -> Self {
      Self { per_cycle: lines.iter().map(|l| l.map(str::to_string)).collect() }
    }
  }

  impl CommandSource for ScriptedCommands {
    fn try_read_line(&mut self) -> Option<String> {
      self.per_cycle.pop_front().flatten()
    }
  }

  fn monitor(stats: ScriptedStats, commands: ScriptedCommands) -> TestMonitor {
    QueueMonitor::new(
      "veth_rr",
      Duration::from_millis(1),
      stats,
      commands,
      Vec::new(),
      StatusLine::new(false),
    )
  }

  type TestMonitor = QueueMonitor<ScriptedStats, ScriptedCommands, Vec<u8>>;

  async fn displayed(m: &mut TestMonitor, cycles: usize) -> Vec<Option<u64>> {
    let mut shown = Vec::new();
    for _ in 0..cycles {
      shown.push(m.cycle().await.map(|row| row.session_drops));
    }
    shown
  }

  #[tokio::test]
  async fn bootstrap_prints_header_and_seeds() {
    let mut m = monitor(ScriptedStats::drops(&[37]), ScriptedCommands::default());
    assert_eq!(m.state(), MonitorState::Bootstrapping);
    m.bootstrap().await.unwrap();
    assert_eq!(m.state(), MonitorState::Running);
    assert_eq!(m.counter().offset(), 37);
    let text = String::from_utf8(m.output().clone()).unwrap();
    assert!(text.starts_with("[*] Monitoring queue on veth_rr\n"));
  }

  #[tokio::test]
  async fn history_before_bootstrap_is_hidden() {
    let mut m = monitor(ScriptedStats::drops(&[37, 37, 37, 37]), ScriptedCommands::default());
    m.bootstrap().await.unwrap();
    assert_eq!(displayed(&mut m, 3).await, vec![Some(0), Some(0), Some(0)]);
  }

  #[tokio::test]
  async fn drops_accumulate_from_bootstrap() {
    let mut m = monitor(ScriptedStats::drops(&[5, 5, 5, 8]), ScriptedCommands::default());
    m.bootstrap().await.unwrap();
    assert_eq!(displayed(&mut m, 3).await, vec![Some(0), Some(0), Some(3)]);
  }

  #[tokio::test]
  async fn clear_between_polls_rebases_to_last_reading() {
    // clear lands before the third poll; cumulative was 5 at that point
    let commands = ScriptedCommands::with(&[None, None, Some("clear\n")]);
    let mut m = monitor(ScriptedStats::drops(&[5, 5, 5, 5]), commands);
    m.bootstrap().await.unwrap();
    assert_eq!(displayed(&mut m, 3).await, vec![Some(0), Some(0), Some(0)]);
    assert_eq!(m.counter().offset(), 5);
  }

  #[tokio::test]
  async fn clear_then_new_drops_count_from_reset() {
    let commands = ScriptedCommands::with(&[None, None, Some("CLEAR")]);
    let mut m = monitor(ScriptedStats::drops(&[5, 5, 9, 12]), commands);
    m.bootstrap().await.unwrap();
    // offset 5, then reset to 9 before the poll that reads 12
    assert_eq!(displayed(&mut m, 3).await, vec![Some(0), Some(4), Some(3)]);
  }

  #[tokio::test]
  async fn clear_makes_current_total_read_zero() {
    let commands = ScriptedCommands::with(&[None, Some("clear")]);
    let mut m = monitor(ScriptedStats::drops(&[0, 20, 20]), commands);
    m.bootstrap().await.unwrap();
    assert_eq!(displayed(&mut m, 2).await, vec![Some(20), Some(0)]);
  }

  #[tokio::test]
  async fn every_waiting_line_is_handled_before_redraw() {
    let commands = ScriptedCommands::with(&[None, Some("hello"), Some("clear"), None]);
    let mut m = QueueMonitor::new(
      "veth_rr",
      Duration::from_millis(1),
      ScriptedStats::drops(&[0, 20, 20]),
      commands,
      Vec::new(),
      StatusLine::new(true).with_columns(80),
    );
    m.bootstrap().await.unwrap();
    assert_eq!(displayed(&mut m, 1).await, vec![Some(20)]);
    let before = m.output().len();
    assert_eq!(displayed(&mut m, 1).await, vec![Some(0)]);
    let text = String::from_utf8(m.output()[before..].to_vec()).unwrap();
    // both echoed lines wiped before the status row was touched
    assert_eq!(text.matches("\x1b[1A\x1b[1G\x1b[J").count(), 2);
    let redraw = text.find("\x1b7").unwrap();
    assert!(text.rfind("\x1b[J").unwrap() < redraw);
  }

  #[tokio::test]
  async fn other_input_is_ignored() {
    let commands = ScriptedCommands::with(&[Some("hello"), Some(""), Some("clear all")]);
    let mut m = monitor(ScriptedStats::drops(&[1, 2, 3, 4]), commands);
    m.bootstrap().await.unwrap();
    assert_eq!(displayed(&mut m, 3).await, vec![Some(1), Some(2), Some(3)]);
  }

  #[tokio::test]
  async fn unavailable_leaves_previous_line() {
    let stats = ScriptedStats {
      polls: VecDeque::from(vec![
        Ok(QueueSample { dropped_total: 2, backlog_packets: 0, backlog_bytes: 0 }),
        Ok(QueueSample { dropped_total: 4, backlog_packets: 3, backlog_bytes: 4542 }),
        Err(StatsError::Tool(ToolError::Timeout {
          tool: "tc".to_string(),
          timeout: Duration::from_secs(1),
        })),
        Ok(QueueSample { dropped_total: 6, backlog_packets: 1, backlog_bytes: 1514 }),
      ]),
    };
    let mut m = monitor(stats, ScriptedCommands::default());
    m.bootstrap().await.unwrap();

    let first = m.cycle().await.unwrap();
    assert_eq!((first.queue_depth, first.session_drops), (3, 2));
    let before = m.status().last_line().map(str::to_string);
    let written = m.output().len();

    assert!(m.cycle().await.is_none());
    assert_eq!(m.status().last_line().map(str::to_string), before);
    assert_eq!(m.output().len(), written);

    let third = m.cycle().await.unwrap();
    assert_eq!((third.queue_depth, third.session_drops), (1, 4));
  }

  #[tokio::test]
  async fn unavailable_bootstrap_seeds_zero() {
    let stats = ScriptedStats {
      polls: VecDeque::from(vec![
        Err(StatsError::EmptyOutput),
        Ok(QueueSample { dropped_total: 4, backlog_packets: 0, backlog_bytes: 0 }),
      ]),
    };
    let mut m = monitor(stats, ScriptedCommands::default());
    m.bootstrap().await.unwrap();
    assert_eq!(m.counter().offset(), 0);
    assert_eq!(displayed(&mut m, 1).await, vec![Some(4)]);
  }

  #[tokio::test]
  async fn missing_tc_is_fatal_at_bootstrap() {
    let stats = ScriptedStats {
      polls: VecDeque::from(vec![Err(StatsError::Tool(ToolError::ToolMissing {
        tool: "tc".to_string(),
      }))]),
    };
    let mut m = monitor(stats, ScriptedCommands::default());
    let err = m.bootstrap().await.unwrap_err();
    assert!(matches!(err, MonitorError::ToolMissing(_)));
  }

  #[tokio::test]
  async fn counter_reset_underneath_never_goes_negative() {
    let mut m = monitor(ScriptedStats::drops(&[100, 110, 3, 8]), ScriptedCommands::default());
    m.bootstrap().await.unwrap();
    assert_eq!(displayed(&mut m, 3).await, vec![Some(10), Some(0), Some(5)]);
  }

  #[tokio::test]
  async fn run_stops_cleanly_on_shutdown() {
    let mut m = monitor(ScriptedStats::drops(&[1, 1, 2, 3]), ScriptedCommands::default());
    m.run(tokio::time::sleep(Duration::from_millis(50))).await.unwrap();
    assert_eq!(m.state(), MonitorState::Stopped);
    let text = String::from_utf8(m.output().clone()).unwrap();
    assert!(text.ends_with("\n[*] Stopped.\n"));
    // every save has its restore
    assert_eq!(text.matches("\x1b7").count(), text.matches("\x1b8").count());
    assert!(text.matches("\x1b7").count() >= 1);
  }

  struct StalledStats;

  impl QueueStatsSource for StalledStats {
    async fn poll(&mut self) -> Result<QueueSample, StatsError> {
      std::future::pending().await
    }
  }

  #[tokio::test]
  async fn interrupt_before_bootstrap_stops_cleanly() {
    let mut m = QueueMonitor::new(
      "veth_rr",
      Duration::from_millis(1),
      StalledStats,
      ScriptedCommands::default(),
      Vec::new(),
      StatusLine::new(false),
    );
    m.run(async {}).await.unwrap();
    assert_eq!(m.state(), MonitorState::Stopped);
    let text = String::from_utf8(m.output().clone()).unwrap();
    assert_eq!(text, "\n[*] Stopped.\n");
  }

  #[tokio::test]
  async fn interrupt_during_stalled_bootstrap_stops_cleanly() {
    let mut m = QueueMonitor::new(
      "veth_rr",
      Duration::from_millis(1),
      StalledStats,
      ScriptedCommands::default(),
      Vec::new(),
      StatusLine::new(false),
    );
    m.run(tokio::time::sleep(Duration::from_millis(20))).await.unwrap();
    assert_eq!(m.state(), MonitorState::Stopped);
    let text = String::from_utf8(m.output().clone()).unwrap();
    assert!(text.starts_with("[*] Monitoring queue on veth_rr\n"));
    assert!(text.ends_with("\n[*] Stopped.\n"));
  }

  #[tokio::test]
  async fn run_surfaces_missing_tc() {
    let stats = ScriptedStats {
      polls: VecDeque::from(vec![Err(StatsError::Tool(ToolError::ToolMissing {
        tool: "tc".to_string(),
      }))]),
    };
    let mut m = monitor(stats, ScriptedCommands::default());
    let result = m.run(std::future::pending::<()>()).await;
    assert!(matches!(result, Err(MonitorError::ToolMissing(_))));
  }
}
