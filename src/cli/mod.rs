//! CLI layer for fanscan.
//!
//! Parses arguments with clap and wires credentials, configuration, and
//! output destinations into a [`Runner`](crate::runner::Runner).

pub mod commands;
pub mod parser;

pub use commands::execute;
pub use parser::Cli;
