/// Scale a bits-per-second figure to the nearest SI unit.
pub fn scale_bits(n: u64) -> String {
  if n > 1_000_000_000 {
    format!("{:.2} gbit/s", n as f64 / 1_000_000_000.0)
  } else if n > 1_000_000 {
    format!("{:.2} mbit/s", n as f64 / 1_000_000.0)
  } else if n > 1_000 {
    format!("{:.2} kbit/s", n as f64 / 1_000.0)
  } else {
    format!("{n} bit/s")
  }
}

/// Scale a byte count to binary units (KiB = 1024 bytes).
pub fn scale_bytes(n: u64) -> String {
  const KB: f64 = 1024.0;
  let n_f = n as f64;
  if n_f >= KB * KB * KB {
    format!("{:.2} GB", n_f / (KB * KB * KB))
  } else if n_f >= KB * KB {
    format!("{:.2} MB", n_f / (KB * KB))
  } else if n_f >= KB {
    format!("{:.2} KB", n_f / KB)
  } else {
    format!("{n} B")
  }
}

/// Microseconds (as reported by iperf3 and the kernel) to a millisecond
/// string.
pub fn scale_rtt_us(us: u64) -> String {
  format!("{:.2} ms", us as f64 / 1000.0)
}
