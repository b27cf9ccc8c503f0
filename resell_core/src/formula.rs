//! Index formulas.
//!
//! All three variants are pure functions of one bucket's observations and the
//! product baseline. [`FormulaKind::DiscountAware`] is the canonical formula; the
//! other two are kept as selectable alternatives.
//!
//! None of these guard against a zero baseline: callers resolve a positive
//! baseline first, and any non-finite result is nulled and repaired downstream.

use serde::{Deserialize, Serialize};

/// Inputs for one bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormulaInputs {
    /// Mean sale price in the bucket.
    pub avg_price: f64,
    /// Trade count in the bucket.
    pub total_volume: f64,
    /// Reference price.
    pub baseline_price: f64,
    /// Reference trade count.
    pub baseline_volume: f64,
    /// Volume vs. premium weighting in `[0, 1]`.
    pub alpha: f64,
    /// Minimum trade count for a discount to move the index.
    pub discount_threshold: f64,
}

/// Which formula to apply per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaKind {
    /// Volume-weighted price relative.
    Plain,
    /// Blend of trade count and clamped premium.
    AlphaWeighted,
    /// Asymmetric blend that ignores thin discount sales.
    #[default]
    DiscountAware,
}

impl FormulaKind {
    /// Evaluate the formula for one bucket.
    pub fn apply(self, i: &FormulaInputs) -> f64 {
        match self {
            FormulaKind::Plain => {
                plain_index(i.avg_price, i.total_volume, i.baseline_price, i.baseline_volume)
            }
            FormulaKind::AlphaWeighted => alpha_weighted_index(
                i.avg_price,
                i.total_volume,
                i.baseline_price,
                i.baseline_volume,
                i.alpha,
            ),
            FormulaKind::DiscountAware => discount_aware_index(
                i.avg_price,
                i.total_volume,
                i.baseline_price,
                i.baseline_volume,
                i.alpha,
                i.discount_threshold,
            ),
        }
    }
}

/// `(avg_price · total_volume) / (baseline_price · baseline_volume) · 100`
pub fn plain_index(
    avg_price: f64,
    total_volume: f64,
    baseline_price: f64,
    baseline_volume: f64,
) -> f64 {
    (avg_price * total_volume) / (baseline_price * baseline_volume) * 100.0
}

/// Premium over the baseline as a fraction of the baseline, clamped at zero.
pub fn clamped_premium(avg_price: f64, baseline_price: f64) -> f64 {
    (avg_price - baseline_price).max(0.0) / baseline_price
}

/// Alpha-weighted premium/volume blend.
///
/// A sale below the baseline price contributes a premium term of exactly 0.
pub fn alpha_weighted_index(
    avg_price: f64,
    total_volume: f64,
    baseline_price: f64,
    baseline_volume: f64,
    alpha: f64,
) -> f64 {
    let normalized_premium = clamped_premium(avg_price, baseline_price);
    let adjusted_weight = alpha * total_volume + (1.0 - alpha) * normalized_premium;
    (avg_price * adjusted_weight) / (baseline_price * baseline_volume) * 100.0
}

/// The blend factor of the discount-aware formula (before the price ratio).
pub fn discount_combined_factor(
    avg_price: f64,
    total_volume: f64,
    baseline_price: f64,
    baseline_volume: f64,
    alpha: f64,
    discount_threshold: f64,
) -> f64 {
    let normalized_volume = if baseline_volume > 0.0 {
        total_volume / baseline_volume
    } else {
        0.0
    };

    if avg_price >= baseline_price {
        let premium_rate = (avg_price - baseline_price) / baseline_price;
        (1.0 - alpha) * premium_rate + alpha * normalized_volume
    } else if total_volume >= discount_threshold {
        let discount_rate = (baseline_price - avg_price) / baseline_price;
        (1.0 - alpha) * -discount_rate + alpha * normalized_volume
    } else {
        // thin discount: price effect dropped, volume still counts
        alpha * normalized_volume
    }
}

/// `(avg_price / baseline_price) · (1 + combined_factor) · 100`
pub fn discount_aware_index(
    avg_price: f64,
    total_volume: f64,
    baseline_price: f64,
    baseline_volume: f64,
    alpha: f64,
    discount_threshold: f64,
) -> f64 {
    let combined = discount_combined_factor(
        avg_price,
        total_volume,
        baseline_price,
        baseline_volume,
        alpha,
        discount_threshold,
    );
    (avg_price / baseline_price) * (1.0 + combined) * 100.0
}
