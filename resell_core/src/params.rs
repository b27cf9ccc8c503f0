//! Tunable parameters for one index computation.
//!
//! [`IndexParams`] is deserializable so it can sit directly under the `[index]`
//! table of a TOML config; every field except `baseline_date` has a default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::formula::FormulaKind;

/// Default alpha (volume vs. premium weighting).
pub const DEFAULT_ALPHA: f64 = 0.1;
/// Default quantile of daily discount counts used as the discount threshold.
pub const DEFAULT_DISCOUNT_QUANTILE: f64 = 0.5;
/// Default discount threshold when no usable quantile exists.
pub const DEFAULT_DISCOUNT_THRESHOLD: f64 = 1.0;
/// Sentinel baseline price substituted when nothing usable is found.
pub const DEFAULT_BASELINE_PRICE: f64 = 10.0;
/// Sentinel baseline volume substituted when nothing usable is found.
pub const DEFAULT_BASELINE_VOLUME: f64 = 1.0;

/// What to do when the catalog has no usable list price for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPricePolicy {
    /// Substitute the sentinel default price.
    #[default]
    Sentinel,
    /// Use the product's own price on the closest trading day, falling back to the
    /// sentinel when that is unusable too.
    ClosestTradingDay,
}

/// Invalid parameter values.
#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    /// `alpha` outside `[0, 1]`.
    #[error("alpha must be within [0, 1], got {0}")]
    Alpha(f64),
    /// `discount_quantile` outside `[0, 1]`.
    #[error("discount_quantile must be within [0, 1], got {0}")]
    Quantile(f64),
    /// Non-positive discount threshold.
    #[error("discount_default_threshold must be > 0, got {0}")]
    Threshold(f64),
    /// Non-positive sentinel price or volume.
    #[error("{field} must be > 0, got {value}")]
    Sentinel {
        /// Offending field name.
        field: &'static str,
        /// Offending value.
        value: f64,
    },
}

/// Parameters shared by the product and market aggregators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexParams {
    /// Reference timestamp; the baseline bucket is rescaled to 100.
    pub baseline_date: DateTime<Utc>,
    /// Volume vs. premium weighting in `[0, 1]`.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Quantile of daily discount counts used as the discount threshold.
    #[serde(default = "default_quantile")]
    pub discount_quantile: f64,
    /// Threshold used when the quantile is unavailable or non-positive.
    #[serde(default = "default_threshold")]
    pub discount_default_threshold: f64,
    /// Sentinel baseline price.
    #[serde(default = "default_price")]
    pub default_baseline_price: f64,
    /// Sentinel baseline volume.
    #[serde(default = "default_volume")]
    pub default_baseline_volume: f64,
    /// Index formula applied per bucket.
    #[serde(default)]
    pub formula: FormulaKind,
    /// Fallback when the catalog price is unusable.
    #[serde(default)]
    pub missing_price: MissingPricePolicy,
    /// Compute products on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}
fn default_quantile() -> f64 {
    DEFAULT_DISCOUNT_QUANTILE
}
fn default_threshold() -> f64 {
    DEFAULT_DISCOUNT_THRESHOLD
}
fn default_price() -> f64 {
    DEFAULT_BASELINE_PRICE
}
fn default_volume() -> f64 {
    DEFAULT_BASELINE_VOLUME
}

impl IndexParams {
    /// Parameters with every default applied.
    pub fn new(baseline_date: DateTime<Utc>) -> Self {
        Self {
            baseline_date,
            alpha: DEFAULT_ALPHA,
            discount_quantile: DEFAULT_DISCOUNT_QUANTILE,
            discount_default_threshold: DEFAULT_DISCOUNT_THRESHOLD,
            default_baseline_price: DEFAULT_BASELINE_PRICE,
            default_baseline_volume: DEFAULT_BASELINE_VOLUME,
            formula: FormulaKind::default(),
            missing_price: MissingPricePolicy::default(),
            parallel: false,
        }
    }

    /// Same parameters with a different alpha.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Same parameters with a different formula.
    pub fn with_formula(mut self, formula: FormulaKind) -> Self {
        self.formula = formula;
        self
    }

    /// Check every range constraint.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ParamsError::Alpha(self.alpha));
        }
        if !(0.0..=1.0).contains(&self.discount_quantile) {
            return Err(ParamsError::Quantile(self.discount_quantile));
        }
        if !(self.discount_default_threshold > 0.0) {
            return Err(ParamsError::Threshold(self.discount_default_threshold));
        }
        for (field, value) in [
            ("default_baseline_price", self.default_baseline_price),
            ("default_baseline_volume", self.default_baseline_volume),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ParamsError::Sentinel { field, value });
            }
        }
        Ok(())
    }
}
