//! Command-line surface of the `resell-index` binary.

pub mod commands;
pub mod params;

pub use commands::{Cli, Commands};
