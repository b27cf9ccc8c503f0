use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use resell_core::BucketWidth;

use super::params::parse_baseline;

#[derive(Parser)]
#[command(name = "resell-index", author, version, about = "Resell market index builder")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the two-pass pipeline and write every series to the output directory
    Run {
        /// Path to the config file (resell_index.toml)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Override `index.baseline_date` (e.g. "2025-01-31" or "2025-01-31T00:00:00Z")
        #[arg(long, value_name = "DATE", value_parser = parse_baseline)]
        baseline: Option<DateTime<Utc>>,
    },

    /// Print one product's index series as CSV on stdout
    Product {
        /// Path to the config file (resell_index.toml)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Product id as it appears in the catalog
        #[arg(long)]
        id: String,

        /// Bucket width: 1D or 4h
        #[arg(long, default_value = "1D")]
        width: BucketWidth,

        /// Override `index.baseline_date`
        #[arg(long, value_name = "DATE", value_parser = parse_baseline)]
        baseline: Option<DateTime<Utc>>,
    },
}
