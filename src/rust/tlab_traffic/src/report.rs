//! Decoding of `iperf3 -J` output into a [`TrafficReport`].

use crate::TrafficError;
use serde::Deserialize;
use std::fmt;
use tlab_utils::packet_scale::{scale_bits, scale_bytes, scale_rtt_us};

/// Summary of one completed client run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficReport {
  /// Seconds the test ran for
  pub elapsed_seconds: f64,
  /// Bytes sent
  pub bytes: u64,
  /// Sender throughput
  pub bits_per_second: f64,
  /// TCP retransmits, if the sender reported them
  pub retransmits: Option<u64>,
  /// Totals as seen by the receiving side, when present
  pub received: Option<ReceivedTotals>,
  /// Round-trip times per stream, for streams that reported them
  pub streams: Vec<StreamRtt>,
}

/// Receiver-side totals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReceivedTotals {
  /// Bytes received
  pub bytes: u64,
  /// Receiver throughput
  pub bits_per_second: f64,
}

/// RTT statistics for one stream, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRtt {
  /// Smallest RTT seen
  pub min_us: u64,
  /// Mean RTT
  pub mean_us: u64,
  /// Largest RTT seen
  pub max_us: u64,
}

#[derive(Deserialize)]
pub(crate) struct IperfJson {
  #[serde(default)]
  end: Option<IperfEnd>,
  #[serde(default)]
  pub(crate) error: Option<String>,
}

#[derive(Deserialize)]
struct IperfEnd {
  sum_sent: Option<IperfSum>,
  #[serde(default)]
  sum_received: Option<IperfSum>,
  #[serde(default)]
  streams: Vec<IperfStream>,
}

#[derive(Deserialize)]
struct IperfSum {
  seconds: f64,
  bytes: u64,
  bits_per_second: f64,
  #[serde(default)]
  retransmits: Option<u64>,
}

#[derive(Deserialize)]
struct IperfStream {
  #[serde(default)]
  sender: Option<IperfStreamSender>,
}

#[derive(Deserialize)]
struct IperfStreamSender {
  min_rtt: Option<u64>,
  mean_rtt: Option<u64>,
  max_rtt: Option<u64>,
}

impl IperfJson {
  pub(crate) fn parse(json: &str) -> Result<Self, TrafficError> {
    serde_json::from_str(json).map_err(|e| TrafficError::MalformedReport(e.to_string()))
  }
}

impl TrafficReport {
  /// Decodes the JSON written by `iperf3 -c ... -J`.
  pub fn from_json(json: &str) -> Result<Self, TrafficError> {
    Self::from_iperf(IperfJson::parse(json)?)
  }

  pub(crate) fn from_iperf(json: IperfJson) -> Result<Self, TrafficError> {
    let end = json
      .end
      .ok_or_else(|| TrafficError::MalformedReport("missing key 'end'".to_string()))?;
    let sent = end
      .sum_sent
      .ok_or_else(|| TrafficError::MalformedReport("missing key 'end.sum_sent'".to_string()))?;

    let streams = end
      .streams
      .iter()
      .filter_map(|s| s.sender.as_ref())
      .filter_map(|s| {
        Some(StreamRtt { min_us: s.min_rtt?, mean_us: s.mean_rtt?, max_us: s.max_rtt? })
      })
      .collect();

    Ok(Self {
      elapsed_seconds: sent.seconds,
      bytes: sent.bytes,
      bits_per_second: sent.bits_per_second,
      retransmits: sent.retransmits,
      received: end
        .sum_received
        .map(|r| ReceivedTotals { bytes: r.bytes, bits_per_second: r.bits_per_second }),
      streams,
    })
  }
}

impl fmt::Display for TrafficReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let rule = "=".repeat(40);
    writeln!(f, "{rule}")?;
    writeln!(f, "       TCP TRAFFIC REPORT       ")?;
    writeln!(f, "{rule}")?;
    writeln!(f, "Duration:      {:.2} s", self.elapsed_seconds)?;
    writeln!(f, "Data Sent:     {}", scale_bytes(self.bytes))?;
    writeln!(f, "Throughput:    {}", scale_bits(self.bits_per_second as u64))?;
    match self.retransmits {
      Some(n) => writeln!(f, "Retransmits:   {n}")?,
      None => writeln!(f, "Retransmits:   n/a")?,
    }
    if let Some(first) = self.streams.first() {
      writeln!(f, "Max RTT:       {}", scale_rtt_us(first.max_us))?;
      writeln!(f, "Mean RTT:      {}", scale_rtt_us(first.mean_us))?;
    }
    if let Some(received) = &self.received {
      writeln!(
        f,
        "Received:      {} at {}",
        scale_bytes(received.bytes),
        scale_bits(received.bits_per_second as u64)
      )?;
    }
    if self.streams.len() > 1 {
      for (i, s) in self.streams.iter().enumerate() {
        writeln!(
          f,
          "Stream {:<3}    min {} / mean {} / max {}",
          i + 1,
          scale_rtt_us(s.min_us),
          scale_rtt_us(s.mean_us),
          scale_rtt_us(s.max_us)
        )?;
      }
    }
    write!(f, "{rule}")
  }
}
