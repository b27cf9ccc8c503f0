//! Discount-volume threshold estimation.
//!
//! A below-baseline sale only moves the discount-aware index when its bucket has
//! at least `threshold` trades. The threshold is a quantile of the product's daily
//! discount-sale counts, so a product that routinely sells a handful of discounted
//! units a day needs more than that to register a markdown.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::Transaction;

/// Quantile with linear interpolation between order statistics.
///
/// `q` is clamped to `[0, 1]`. Returns `None` for an empty sample.
pub fn quantile(sample: &[f64], q: f64) -> Option<f64> {
    if sample.is_empty() {
        return None;
    }
    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Count discount sales (price below `baseline_price`) per UTC calendar date.
pub fn daily_discount_counts<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    baseline_price: f64,
) -> BTreeMap<NaiveDate, u64> {
    let mut counts = BTreeMap::new();
    for t in transactions {
        if t.price < baseline_price {
            *counts.entry(t.date_created.date_naive()).or_insert(0) += 1;
        }
    }
    counts
}

/// Minimum trade count for a discount bucket to be treated as a real markdown.
///
/// Falls back to `default_threshold` when there are no discount sales or the
/// quantile comes out non-positive.
pub fn estimate_threshold<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    baseline_price: f64,
    quantile_q: f64,
    default_threshold: f64,
) -> f64 {
    let counts: Vec<f64> = daily_discount_counts(transactions, baseline_price)
        .into_values()
        .map(|c| c as f64)
        .collect();
    match quantile(&counts, quantile_q) {
        Some(t) if t > 0.0 => t,
        _ => default_threshold,
    }
}
