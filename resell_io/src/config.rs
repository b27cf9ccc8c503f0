//! Run configuration: parsing, normalization, and loading.
//!
//! The TOML file has four tables:
//! - `[index]`: [`IndexParams`] (baseline date, alpha, formula, policies)
//! - `[input]`: transaction path, catalog path, source time zone, DST policy
//! - `[output]`: output directory and log file name
//! - `[pipeline]`: constituent count for the fine pass and the alpha sweep
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_config_str`]
//! - Parse + normalize from a file path: [`load_config_path`]
//!
//! Relative input/output paths stay relative to the working directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono_tz::Tz;
use resell_core::IndexParams;
use serde::{Deserialize, Serialize};
use toml::from_str;

use crate::tz::{self, DstPolicy};

/// Default number of products carried into the fine pass.
pub const DEFAULT_CONSTITUENTS: usize = 50;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Index parameters.
    pub index: IndexParams,
    /// Where inputs come from.
    pub input: InputCfg,
    /// Where outputs go.
    #[serde(default)]
    pub output: OutputCfg,
    /// Two-pass pipeline knobs.
    #[serde(default)]
    pub pipeline: PipelineCfg,
}

/// `[input]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InputCfg {
    /// CSV file or directory of CSV files with transactions.
    pub transactions: PathBuf,
    /// Catalog CSV.
    pub catalog: PathBuf,
    /// IANA zone for timestamps without an offset.
    #[serde(default = "default_tz")]
    pub source_timezone: String,
    /// How naive timestamps that fall in a DST gap or overlap are resolved.
    #[serde(default)]
    pub dst_policy: DstPolicy,
}

/// `[output]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputCfg {
    /// Directory for series and log files.
    #[serde(default = "default_out_dir")]
    pub dir: PathBuf,
    /// Log file name inside `dir`.
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

impl Default for OutputCfg {
    fn default() -> Self {
        Self {
            dir: default_out_dir(),
            log_file: default_log_file(),
        }
    }
}

/// `[pipeline]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineCfg {
    /// Products carried into the 4-hour pass.
    #[serde(default = "default_constituents")]
    pub constituents: usize,
    /// Extra daily market series, one per alpha.
    #[serde(default)]
    pub alphas: Vec<f64>,
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self {
            constituents: DEFAULT_CONSTITUENTS,
            alphas: Vec::new(),
        }
    }
}

fn default_tz() -> String {
    "UTC".to_string()
}
fn default_out_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_log_file() -> String {
    "interpolation_log.csv".to_string()
}
fn default_constituents() -> usize {
    DEFAULT_CONSTITUENTS
}

impl AppConfig {
    /// The parsed source time zone. Valid after normalization.
    pub fn source_tz(&self) -> anyhow::Result<Tz> {
        tz::parse_zone(&self.input.source_timezone)
            .with_context(|| format!("input.source_timezone = {:?}", self.input.source_timezone))
    }
}

/// Normalize a config in place.
///
/// What normalization does:
/// - Trim the time zone name and the log file name; reject empty values
/// - Validate the time zone and every index parameter
/// - Validate each sweep alpha; drop repeated alphas, keeping the first
///
/// Errors:
/// - Unknown time zone
/// - Any [`resell_core::ParamsError`]
/// - Empty log file name, sweep alpha outside `[0, 1]`
pub fn normalize_config(cfg: &mut AppConfig) -> anyhow::Result<()> {
    cfg.input.source_timezone = cfg.input.source_timezone.trim().to_string();
    if cfg.input.source_timezone.is_empty() {
        cfg.input.source_timezone = default_tz();
    }
    cfg.source_tz()?;

    cfg.output.log_file = cfg.output.log_file.trim().to_string();
    if cfg.output.log_file.is_empty() {
        bail!("output.log_file cannot be empty after trimming");
    }

    cfg.index.validate().context("invalid [index] parameters")?;

    let mut alphas: Vec<f64> = Vec::with_capacity(cfg.pipeline.alphas.len());
    for &a in &cfg.pipeline.alphas {
        if !(0.0..=1.0).contains(&a) {
            bail!("pipeline.alphas entries must be within [0, 1], got {a}");
        }
        if !alphas.contains(&a) {
            alphas.push(a);
        }
    }
    cfg.pipeline.alphas = alphas;
    Ok(())
}

/// Parse and normalize a config from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<AppConfig> {
    let mut cfg: AppConfig = from_str(toml_str).context("failed to parse config TOML")?;
    normalize_config(&mut cfg).context("normalize_config failed")?;
    Ok(cfg)
}

/// Read a config TOML file from disk, parse, and normalize it.
pub fn load_config_path(path: impl AsRef<Path>) -> anyhow::Result<AppConfig> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    load_config_str(&s).with_context(|| format!("in {}", path.display()))
}
