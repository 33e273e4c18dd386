use std::{
  ffi::OsStr,
  io::ErrorKind,
  process::{ExitStatus, Stdio},
  time::Duration,
};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Captured result of an external tool run that finished in time.
#[derive(Debug)]
pub struct ToolOutput {
  /// Exit status of the tool.
  pub status: ExitStatus,
  /// Raw standard output.
  pub stdout: Vec<u8>,
  /// Raw standard error.
  pub stderr: Vec<u8>,
}

impl ToolOutput {
  /// Converts a non-zero exit into `ToolError::NonZeroExit`.
  pub fn require_success(self, tool: &str) -> Result<Self, ToolError> {
    if self.status.success() {
      Ok(self)
    } else {
      Err(ToolError::NonZeroExit {
        tool: tool.to_string(),
        status: self.status,
        stderr: String::from_utf8_lossy(&self.stderr).trim().to_string(),
      })
    }
  }
}

/// Runs `tool` with `args`, capturing stdout and stderr, and gives up
/// after `timeout`. The child is killed if the wait is abandoned, whether
/// by the timeout or by the calling future being dropped.
///
/// stdin is detached from the child so that it never competes with the
/// operator for console input.
///
/// ```no_run
/// # async fn demo() -> Result<(), tlab_utils::ToolError> {
/// use std::time::Duration;
/// let out = tlab_utils::run_with_timeout("tc", &["-s", "qdisc"], Duration::from_secs(1)).await?;
/// assert!(out.status.success());
/// # Ok(())
/// # }
/// ```
pub async fn run_with_timeout<S: AsRef<OsStr>>(
  tool: &str,
  args: &[S],
  timeout: Duration,
) -> Result<ToolOutput, ToolError> {
  let child = Command::new(tool)
    .args(args)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true)
    .spawn()
    .map_err(|e| {
      if e.kind() == ErrorKind::NotFound {
        info!("{tool} is not installed or not on the PATH");
        ToolError::ToolMissing { tool: tool.to_string() }
      } else {
        info!("Failed to start {tool}: {e:?}");
        ToolError::Spawn { tool: tool.to_string(), source: e }
      }
    })?;

  match tokio::time::timeout(timeout, child.wait_with_output()).await {
    Ok(Ok(output)) => Ok(ToolOutput {
      status: output.status,
      stdout: output.stdout,
      stderr: output.stderr,
    }),
    Ok(Err(e)) => {
      info!("Failed waiting for {tool}: {e:?}");
      Err(ToolError::Spawn { tool: tool.to_string(), source: e })
    }
    Err(_) => {
      debug!("{tool} exceeded {timeout:?}, killed");
      Err(ToolError::Timeout { tool: tool.to_string(), timeout })
    }
  }
}

/// Renders a command and its arguments the way an operator would type it.
pub fn command_line<S: AsRef<str>>(tool: &str, args: &[S]) -> String {
  let mut line = tool.to_string();
  for arg in args {
    line.push(' ');
    line.push_str(arg.as_ref());
  }
  line
}

/// Failures running an external tool.
#[derive(Error, Debug)]
pub enum ToolError {
  /// The binary could not be found.
  #[error("{tool} not found")]
  ToolMissing {
    /// Name or path of the tool
    tool: String,
  },
  /// The binary exists but could not be started or waited on.
  #[error("Unable to run {tool}")]
  Spawn {
    /// Name or path of the tool
    tool: String,
    /// Underlying I/O error
    #[source]
    source: std::io::Error,
  },
  /// The tool did not exit in time and was killed.
  #[error("{tool} did not finish within {timeout:?}")]
  Timeout {
    /// Name or path of the tool
    tool: String,
    /// The limit that was exceeded
    timeout: Duration,
  },
  /// The tool ran but reported failure.
  #[error("{tool} exited with {status}: {stderr}")]
  NonZeroExit {
    /// Name or path of the tool
    tool: String,
    /// Exit status
    status: ExitStatus,
    /// Captured stderr, trimmed
    stderr: String,
  },
}

impl ToolError {
  /// True when the tool is not installed at all.
  pub fn is_missing(&self) -> bool {
    matches!(self, ToolError::ToolMissing { .. })
  }
}
