//! Merges the configuration file with command-line flags. Flags win.

use anyhow::{bail, Result};
use clap::Args;
use std::time::Duration;
use tlab_config::Config;
use tlab_queue_monitor::MonitorSettings;
use tlab_traffic::{GeneratorRequest, ReceiverRequest};

#[derive(Args, Debug, Default)]
pub struct MonitorArgs {
  /// Network interface to watch (e.g. eth0)
  #[arg(short, long)]
  pub interface: Option<String>,

  /// Refresh interval in seconds
  #[arg(long)]
  pub interval: Option<f64>,

  /// Give up on a single `tc` call after this many milliseconds
  #[arg(long)]
  pub timeout_ms: Option<u64>,
}

#[derive(Args, Debug, Default)]
pub struct SendArgs {
  /// Receiver IP address
  #[arg(short, long)]
  pub target: String,

  /// Receiver port
  #[arg(short, long)]
  pub port: Option<u16>,

  /// Test duration in seconds
  #[arg(short, long)]
  pub duration: Option<u32>,

  /// Bandwidth per stream (e.g. 10M, 1G)
  #[arg(short, long)]
  pub bandwidth: Option<String>,

  /// TCP congestion control algorithm (e.g. cubic, bbr)
  #[arg(short, long)]
  pub congestion: Option<String>,

  /// Number of parallel streams
  #[arg(short = 'P', long)]
  pub parallel: Option<u32>,

  /// Reverse mode: the receiver sends
  #[arg(short = 'R', long)]
  pub reverse: bool,
}

#[derive(Args, Debug, Default)]
pub struct ReceiveArgs {
  /// Port to listen on
  #[arg(short, long)]
  pub port: Option<u16>,

  /// Exit after one test
  #[arg(long)]
  pub one_off: bool,
}

pub fn monitor_settings(config: &Config, args: &MonitorArgs) -> Result<MonitorSettings> {
  let Some(interface) = args.interface.clone().or_else(|| config.monitor.interface.clone()) else {
    bail!("No interface given. Use --interface or set monitor.interface in the configuration");
  };
  let interval = args.interval.unwrap_or(config.monitor.interval_seconds);
  let interval = match Duration::try_from_secs_f64(interval) {
    Ok(d) if !d.is_zero() => d,
    _ => bail!("Interval must be a positive number of seconds, not {interval}"),
  };
  let timeout_ms = args.timeout_ms.unwrap_or(config.monitor.command_timeout_ms);
  if timeout_ms == 0 {
    bail!("Command timeout must be greater than zero");
  }
  Ok(MonitorSettings {
    interface,
    interval,
    tc_path: config.monitor.tc_path.clone(),
    command_timeout: Duration::from_millis(timeout_ms),
  })
}

pub fn generator_request(config: &Config, args: &SendArgs) -> Result<GeneratorRequest> {
  let parallel = args.parallel.unwrap_or(config.traffic.parallel);
  if parallel == 0 {
    bail!("At least one stream is required");
  }
  let port = args.port.unwrap_or(config.traffic.port);
  if port == 0 {
    bail!("Port must be between 1 and 65535");
  }
  let congestion = args.congestion.clone().unwrap_or_else(|| config.traffic.congestion.clone());
  Ok(GeneratorRequest {
    target: args.target.clone(),
    port,
    duration_seconds: args.duration.unwrap_or(config.traffic.duration_seconds),
    bandwidth: args.bandwidth.clone().filter(|b| !b.is_empty()),
    congestion: Some(congestion).filter(|c| !c.is_empty()),
    parallel,
    reverse: args.reverse,
  })
}

pub fn receiver_request(config: &Config, args: &ReceiveArgs) -> Result<ReceiverRequest> {
  let port = args.port.unwrap_or(config.traffic.port);
  if port == 0 {
    bail!("Port must be between 1 and 65535");
  }
  Ok(ReceiverRequest { port, one_off: args.one_off })
}
