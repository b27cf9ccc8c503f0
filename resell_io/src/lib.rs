//! File-backed I/O around `resell_core`: CSV collaborators, TOML configuration,
//! timestamp parsing, and the two-pass pipeline behind the `resell-index` binary.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod io;
pub mod pipeline;
pub mod tz;

pub use config::{AppConfig, load_config_path, load_config_str};
pub use pipeline::{PipelineReport, run_pipeline};
