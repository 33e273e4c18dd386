/*
qdisc fq_codel 0: root refcnt 2 limit 10240p flows 1024 quantum 1514 target 5ms interval 100ms memory_limit 32Mb ecn drop_batch 64
 Sent 3418570 bytes 2380 pkt (dropped 17, overlimits 0 requeues 0)
 backlog 3028b 2p requeues 0
  maxpacket 1514 drop_overlimit 0 new_flow_count 3 ecn_mark 0
  new_flows_len 0 old_flows_len 1
*/

/// One reading of the qdisc counters we care about. A fresh sample is
/// parsed on every poll and replaces the previous one.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueSample {
  /// Cumulative drops since the qdisc was created.
  pub dropped_total: u64,
  /// Packets currently enqueued.
  pub backlog_packets: u64,
  /// Bytes currently enqueued.
  pub backlog_bytes: u64,
}

impl QueueSample {
  /// Extracts the drop count and backlog from plain `tc -s qdisc show`
  /// output. Each field is found independently, anywhere in the text;
  /// the first well-formed occurrence wins. A field that is absent is a
  /// genuine zero (e.g. a qdisc that reports no backlog line).
  pub fn parse(output: &str) -> Self {
    let (backlog_bytes, backlog_packets) = find_backlog(output).unwrap_or((0, 0));
    Self {
      dropped_total: find_dropped(output).unwrap_or(0),
      backlog_packets,
      backlog_bytes,
    }
  }
}

/// `dropped <n>`
fn find_dropped(text: &str) -> Option<u64> {
  text.match_indices("dropped").find_map(|(i, token)| {
    let rest = after_whitespace(&text[i + token.len()..])?;
    let (n, _) = leading_number(rest)?;
    Some(n)
  })
}

/// `backlog <bytes>b <packets>p`. tc abbreviates large byte counts as
/// `15Kb` or `2Mb`.
fn find_backlog(text: &str) -> Option<(u64, u64)> {
  text.match_indices("backlog").find_map(|(i, token)| {
    let rest = after_whitespace(&text[i + token.len()..])?;
    let (bytes, rest) = leading_number(rest)?;
    let (scale, rest) = size_suffix(rest);
    let rest = rest.strip_prefix('b')?;
    let rest = after_whitespace(rest)?;
    let (packets, rest) = leading_number(rest)?;
    rest.strip_prefix('p')?;
    Some((bytes.saturating_mul(scale), packets))
  })
}

/// Requires at least one whitespace character, and skips all of it.
fn after_whitespace(s: &str) -> Option<&str> {
  let trimmed = s.trim_start();
  if trimmed.len() == s.len() {
    None
  } else {
    Some(trimmed)
  }
}

fn leading_number(s: &str) -> Option<(u64, &str)> {
  let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
  if end == 0 {
    return None;
  }
  let n = s[..end].parse().ok()?;
  Some((n, &s[end..]))
}

fn size_suffix(s: &str) -> (u64, &str) {
  match s.as_bytes().first() {
    Some(b'K') => (1024, &s[1..]),
    Some(b'M') => (1024 * 1024, &s[1..]),
    Some(b'G') => (1024 * 1024 * 1024, &s[1..]),
    _ => (1, s),
  }
}
