mod console;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::{info, problem};
use settings::{generator_request, monitor_settings, receiver_request, MonitorArgs, ReceiveArgs, SendArgs};
use std::path::PathBuf;
use tlab_config::load_config_from;
use tlab_queue_monitor::{run_queue_monitor, shutdown_signal, MonitorError};
use tlab_traffic::{run_generator, run_receiver, ReceiverOutcome, TrafficError};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(version, about = "Traffic lab: load a link with iperf3 and watch its queue", long_about = None)]
struct Cli {
  /// Configuration file (default: $TLAB_CONFIG, then /etc/tlab.conf)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Live view of queue depth and drops on an interface
  Monitor(MonitorArgs),
  /// Generate TCP traffic towards a receiver and report on it
  Send(SendArgs),
  /// Run an iperf3 server to receive traffic
  Receive(ReceiveArgs),
}

fn set_console_logging() -> Result<()> {
  let level = if let Ok(level) = std::env::var("RUST_LOG") {
    match level.to_lowercase().as_str() {
      "trace" => LevelFilter::TRACE,
      "debug" => LevelFilter::DEBUG,
      "info" => LevelFilter::INFO,
      "warn" => LevelFilter::WARN,
      "error" => LevelFilter::ERROR,
      _ => LevelFilter::WARN,
    }
  } else {
    LevelFilter::WARN
  };

  // stdout belongs to the live display
  let subscriber = tracing_subscriber::fmt()
    .with_max_level(level)
    .with_writer(std::io::stderr)
    .compact()
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(false)
    .with_target(false)
    .finish();

  tracing::subscriber::set_global_default(subscriber)?;
  Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
  set_console_logging()?;
  let cli = Cli::parse();
  let config = load_config_from(cli.config.as_deref())?;

  match cli.command {
    Commands::Monitor(args) => monitor(monitor_settings(&config, &args)?).await,
    Commands::Send(args) => {
      send(&config.traffic.iperf_path, generator_request(&config, &args)?).await;
      Ok(())
    }
    Commands::Receive(args) => {
      receive(&config.traffic.iperf_path, receiver_request(&config, &args)?).await;
      Ok(())
    }
  }
}

async fn monitor(settings: tlab_queue_monitor::MonitorSettings) -> Result<()> {
  let tc_path = settings.tc_path.clone();
  match run_queue_monitor(settings).await {
    Ok(()) => Ok(()),
    Err(MonitorError::ToolMissing(e)) => {
      tracing::debug!("{e:?}");
      problem(&format!(
        "{tc_path} not found. Please install iproute2 (e.g., 'sudo apt install iproute2')."
      ));
      std::process::exit(1);
    }
    Err(e) => Err(e.into()),
  }
}

async fn send(iperf_path: &str, request: tlab_traffic::GeneratorRequest) {
  info(&format!(
    "Starting TCP traffic to {}:{} (Streams: {})...",
    request.target, request.port, request.parallel
  ));
  info(&format!("Running command: {}", request.command_line(iperf_path)));

  match run_generator(iperf_path, &request).await {
    Ok(report) => println!("\n{report}"),
    Err(e @ TrafficError::ToolMissing { .. }) => {
      problem(&e.to_string());
      std::process::exit(1);
    }
    Err(e) => problem(&e.to_string()),
  }
}

async fn receive(iperf_path: &str, request: tlab_traffic::ReceiverRequest) {
  info(&format!("Starting iperf3 server on port {}...", request.port));
  info(&format!("Command: {}", request.command_line(iperf_path)));

  match run_receiver(iperf_path, &request, shutdown_signal()).await {
    Ok(ReceiverOutcome::Completed) => {}
    Ok(ReceiverOutcome::Failed(status)) => {
      problem(&format!("Error running iperf3 server: {status}"));
    }
    Ok(ReceiverOutcome::Interrupted) => {
      println!();
      info("Server stopped.");
    }
    Err(e @ TrafficError::ToolMissing { .. }) => {
      problem(&e.to_string());
      std::process::exit(1);
    }
    Err(e) => problem(&e.to_string()),
  }
}
