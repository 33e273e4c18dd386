//! Collection of utility functions shared by the tlab tools

#![warn(missing_docs)]
mod commands;

/// Utilities for scaling bits and bytes to human-readable format
pub mod packet_scale;

pub use commands::{command_line, run_with_timeout, ToolError, ToolOutput};
