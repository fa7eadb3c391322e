//! Command-line interface for podcover.
//!
//! Resolve covers, build request ids and inspect the cover cache without a
//! UI in front.

mod commands;

pub use commands::{Cli, Commands, run_command};
