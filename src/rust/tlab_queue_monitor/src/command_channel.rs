use std::io::{BufRead, ErrorKind};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use tracing::debug;

/// Operator input that the monitor can act upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
  /// Zero the session drop counter.
  Clear,
}

impl OperatorCommand {
  /// Trims and case-folds `line`. Anything unrecognized is `None`.
  pub fn parse(line: &str) -> Option<Self> {
    match line.trim().to_lowercase().as_str() {
      "clear" => Some(OperatorCommand::Clear),
      _ => None,
    }
  }
}

/// A source of operator lines that never blocks.
pub trait CommandSource {
  /// Returns a line if one is ready, otherwise `None` immediately.
  fn try_read_line(&mut self) -> Option<String>;
}

/// Reads stdin on a dedicated thread and hands lines over one at a
/// time, so the sampling loop only ever does a `try_recv`.
pub struct StdinCommandChannel {
  rx: Receiver<String>,
}

impl StdinCommandChannel {
  /// Starts listening on the process's stdin.
  pub fn spawn() -> std::io::Result<Self> {
    Self::from_reader(std::io::BufReader::new(std::io::stdin()))
  }

  /// Starts listening on any line-oriented reader.
  pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> std::io::Result<Self> {
    let (tx, rx) = sync_channel(1);
    std::thread::Builder::new()
      .name("Command Channel".to_string())
      .spawn(move || read_lines(reader, tx))?;
    Ok(Self { rx })
  }
}

impl CommandSource for StdinCommandChannel {
  fn try_read_line(&mut self) -> Option<String> {
    // Disconnected (stdin closed) reads the same as "nothing yet".
    self.rx.try_recv().ok()
  }
}

fn read_lines<R: BufRead>(mut reader: R, tx: SyncSender<String>) {
  let mut buffer = Vec::new();
  loop {
    buffer.clear();
    match reader.read_until(b'\n', &mut buffer) {
      Ok(0) => {
        debug!("stdin closed, no more operator commands");
        return;
      }
      Ok(_) => {
        let line = String::from_utf8_lossy(&buffer).into_owned();
        if tx.send(line).is_err() {
          return;
        }
      }
      Err(e) if e.kind() == ErrorKind::Interrupted => continue,
      Err(e) => {
        debug!("Error reading stdin: {e:?}");
        return;
      }
    }
  }
}
