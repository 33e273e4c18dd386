//! Terminal output for the monitor: a static header printed once, then a
//! single status row rewritten in place.
//!
//! The status row always sits one row above the cursor. Every redraw
//! saves the cursor, moves up to the status row, overwrites it and clears
//! any leftovers, then restores the cursor. Nothing here emits a newline,
//! so redraws never scroll the terminal.

use chrono::Local;
use crossterm::{
  cursor::{MoveToColumn, MoveUp, RestorePosition, SavePosition},
  queue,
  style::Print,
  terminal::{self, Clear, ClearType},
};
use std::{fmt, io::Write};

/// Width of the `-----` rules around the column header.
const SEPARATOR_WIDTH: usize = 55;

/// Values shown on the status row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
  /// Wall-clock time, `HH:MM:SS`
  pub time: String,
  /// Current backlog, in packets
  pub queue_depth: u64,
  /// Drops since the session zero point
  pub session_drops: u64,
}

impl StatusRow {
  /// A row stamped with the current local time.
  pub fn now(queue_depth: u64, session_drops: u64) -> Self {
    Self {
      time: Local::now().format("%H:%M:%S").to_string(),
      queue_depth,
      session_drops,
    }
  }

  /// The row printed under the header before any sample arrives.
  pub fn placeholder() -> Self {
    Self { time: "--:--:--".to_string(), queue_depth: 0, session_drops: 0 }
  }
}

impl fmt::Display for StatusRow {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:<10} | {:<20} | {:<15}", self.time, self.queue_depth, self.session_drops)
  }
}

/// Prints the banner, the column header and a placeholder status row.
/// The cursor is left on the row below it, where operator input goes.
pub fn write_header<W: Write>(out: &mut W, interface: &str) -> std::io::Result<()> {
  let rule = "-".repeat(SEPARATOR_WIDTH);
  writeln!(out, "[*] Monitoring queue on {interface}")?;
  writeln!(out, "[*] Type 'clear' and press Enter to reset drop counter.")?;
  writeln!(out, "[*] Press Ctrl+C to stop.")?;
  writeln!(out, "{rule}")?;
  writeln!(out, "{:<10} | {:<20} | {:<15}", "Time", "Queue Depth (pkts)", "Drops (Session)")?;
  writeln!(out, "{rule}")?;
  writeln!(out, "{}", StatusRow::placeholder())?;
  out.flush()
}

/// The in-place status row and the bookkeeping needed to find it again.
#[derive(Debug, Default)]
pub struct StatusLine {
  input_is_echoed: bool,
  columns: Option<u16>,
  last_line: Option<String>,
}

impl StatusLine {
  /// `input_is_echoed` should be true when stdin is a terminal: every
  /// line the operator enters then pushes the cursor down one row.
  pub fn new(input_is_echoed: bool) -> Self {
    Self { input_is_echoed, columns: None, last_line: None }
  }

  /// Fixes the terminal width used to work out how many rows an echoed
  /// line wrapped onto. Without it the width is asked of the terminal
  /// on every absorbed line.
  pub fn with_columns(mut self, columns: u16) -> Self {
    self.columns = Some(columns);
    self
  }

  /// Text currently on the status row, if a redraw has happened.
  pub fn last_line(&self) -> Option<&str> {
    self.last_line.as_deref()
  }

  /// Overwrites the status row with `row`.
  pub fn redraw<W: Write>(&mut self, out: &mut W, row: &StatusRow) -> std::io::Result<()> {
    let line = row.to_string();
    queue!(
      out,
      SavePosition,
      MoveUp(1),
      MoveToColumn(0),
      Print(&line),
      Clear(ClearType::UntilNewLine),
      RestorePosition
    )?;
    out.flush()?;
    self.last_line = Some(line);
    Ok(())
  }

  /// The operator just pressed Enter on `line`. Wipe the echoed text,
  /// including any rows it wrapped onto, and move back up so the status
  /// row is once again directly above the cursor. Call once per line,
  /// before the next redraw.
  pub fn absorb_input_line<W: Write>(&mut self, out: &mut W, line: &str) -> std::io::Result<()> {
    if !self.input_is_echoed {
      return Ok(());
    }
    let columns = self
      .columns
      .or_else(|| terminal::size().ok().map(|(columns, _)| columns));
    let rows = echoed_rows(line, columns);
    queue!(out, MoveUp(rows), MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
    out.flush()
  }
}

/// Rows a typed line occupies once echoed. An empty line still takes
/// one. Unknown width means no wrapping is assumed.
fn echoed_rows(line: &str, columns: Option<u16>) -> u16 {
  let typed = line.trim_end_matches(['\n', '\r']).chars().count();
  let rows = match columns {
    Some(columns) if columns > 0 => typed.div_ceil(usize::from(columns)).max(1),
    _ => 1,
  };
  u16::try_from(rows).unwrap_or(u16::MAX)
}
