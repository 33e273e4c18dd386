use crate::{
  report::{IperfJson, TrafficReport},
  TrafficError,
};
use std::time::Duration;
use tlab_utils::{command_line, run_with_timeout, ToolError};
use tracing::{debug, info};

/// Extra time allowed beyond the test duration for connection setup and
/// the final exchange of results.
const GENERATOR_GRACE: Duration = Duration::from_secs(30);

/// One TCP client run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorRequest {
  /// Receiver address
  pub target: String,
  /// Receiver port
  pub port: u16,
  /// Test length in seconds
  pub duration_seconds: u32,
  /// Per-stream pacing rate in iperf3 notation (e.g. `10M`)
  pub bandwidth: Option<String>,
  /// TCP congestion control algorithm
  pub congestion: Option<String>,
  /// Number of parallel streams
  pub parallel: u32,
  /// Receiver sends, client receives
  pub reverse: bool,
}

impl GeneratorRequest {
  /// `iperf3` arguments for this request, always in JSON mode.
  pub fn args(&self) -> Vec<String> {
    let mut args = vec![
      "-c".to_string(),
      self.target.clone(),
      "-p".to_string(),
      self.port.to_string(),
      "-t".to_string(),
      self.duration_seconds.to_string(),
      "-J".to_string(),
    ];
    if let Some(congestion) = &self.congestion {
      args.extend(["-C".to_string(), congestion.clone()]);
    }
    if let Some(bandwidth) = &self.bandwidth {
      args.extend(["-b".to_string(), bandwidth.clone()]);
    }
    if self.parallel > 1 {
      args.extend(["-P".to_string(), self.parallel.to_string()]);
    }
    if self.reverse {
      args.push("-R".to_string());
    }
    args
  }

  /// The full command line, for showing the operator.
  pub fn command_line(&self, iperf_path: &str) -> String {
    command_line(iperf_path, &self.args())
  }

  fn time_limit(&self) -> Duration {
    Duration::from_secs(u64::from(self.duration_seconds)) + GENERATOR_GRACE
  }
}

/// Runs the client and decodes its report. Failure of the tool and an
/// undecodable report are distinct errors; neither produces a zeroed
/// report.
pub async fn run_generator(
  iperf_path: &str,
  request: &GeneratorRequest,
) -> Result<TrafficReport, TrafficError> {
  info!("Running {}", request.command_line(iperf_path));
  let output = run_with_timeout(iperf_path, &request.args(), request.time_limit())
    .await
    .map_err(|e| match e {
      ToolError::ToolMissing { tool } => TrafficError::ToolMissing { tool },
      other => TrafficError::ToolFailed { tool: iperf_path.to_string(), message: other.to_string() },
    })?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  if !output.status.success() {
    // iperf3 -J reports its own errors inside the JSON document
    let message = IperfJson::parse(&stdout)
      .ok()
      .and_then(|json| json.error)
      .unwrap_or_else(|| {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
          format!("exited with {}", output.status)
        } else {
          stderr
        }
      });
    debug!("{iperf_path} failed with {}: {message}", output.status);
    return Err(TrafficError::ToolFailed { tool: iperf_path.to_string(), message });
  }

  TrafficReport::from_json(&stdout)
}
