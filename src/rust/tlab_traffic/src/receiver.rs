use crate::TrafficError;
use std::{
  future::Future,
  io::ErrorKind,
  process::{ExitStatus, Stdio},
};
use tlab_utils::command_line;
use tokio::process::Command;
use tracing::{info, warn};

/// One `iperf3` server run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverRequest {
  /// Listen port
  pub port: u16,
  /// Exit after the first completed test
  pub one_off: bool,
}

impl ReceiverRequest {
  /// `iperf3` arguments for this request.
  pub fn args(&self) -> Vec<String> {
    let mut args = vec!["-s".to_string(), "-p".to_string(), self.port.to_string()];
    if self.one_off {
      args.push("-1".to_string());
    }
    args
  }

  /// The full command line, for showing the operator.
  pub fn command_line(&self, iperf_path: &str) -> String {
    command_line(iperf_path, &self.args())
  }
}

/// How a server run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverOutcome {
  /// The server exited successfully (e.g. one-off mode after a test).
  Completed,
  /// The server exited with an error. Reported, not fatal.
  Failed(ExitStatus),
  /// The operator stopped it.
  Interrupted,
}

/// Runs the server with its output going straight to our terminal,
/// until it exits or `shutdown` resolves.
pub async fn run_receiver<F: Future<Output = ()>>(
  iperf_path: &str,
  request: &ReceiverRequest,
  shutdown: F,
) -> Result<ReceiverOutcome, TrafficError> {
  info!("Running {}", request.command_line(iperf_path));
  let mut child = Command::new(iperf_path)
    .args(request.args())
    .stdin(Stdio::null())
    .stdout(Stdio::inherit())
    .stderr(Stdio::inherit())
    .kill_on_drop(true)
    .spawn()
    .map_err(|e| {
      if e.kind() == ErrorKind::NotFound {
        TrafficError::ToolMissing { tool: iperf_path.to_string() }
      } else {
        TrafficError::Io(e)
      }
    })?;

  tokio::pin!(shutdown);
  tokio::select! {
    biased;
    _ = &mut shutdown => {
      if let Err(e) = child.kill().await {
        warn!("Unable to stop {iperf_path}: {e:?}");
      }
      Ok(ReceiverOutcome::Interrupted)
    }
    status = child.wait() => {
      let status = status?;
      if status.success() {
        Ok(ReceiverOutcome::Completed)
      } else {
        Ok(ReceiverOutcome::Failed(status))
      }
    }
  }
}
