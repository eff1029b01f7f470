//! Library half of the `wgraph` command-line tool.
//!
//! Commands live in [`commands`] and share the terminal helpers in
//! [`output`], so they can be exercised from tests without spawning the
//! binary.

pub mod commands;
pub mod output;

pub use output::OutputFormat;
