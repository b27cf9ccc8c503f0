//! Baseline resolution.
//!
//! Given a product's bucketed history and a target date, find the reference
//! price and volume to normalize against:
//!
//! 1. the bucket that contains the baseline date, if there is one;
//! 2. otherwise the calendar date closest to the baseline date (ties go to the
//!    earlier date), averaging that date's buckets;
//! 3. otherwise the mean of the column after forward-fill, backward-fill and
//!    linear interpolation;
//! 4. otherwise the sentinel default.
//!
//! [`resolve_price`] and [`resolve_volume`] report where the value came from and
//! may yield nothing. [`resolve_baseline`] is what the per-product aggregator
//! calls: it prefers the catalog price, applies the sentinels, logs the
//! synthesized values, and always returns finite positive numbers.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    bucket::BucketWidth,
    fill,
    log::{InterpolationLog, InterpolationLogEntry, LogColumn, RepairMethod},
    models::{Baseline, Bucket, ProductMeta, Provenance},
    params::{IndexParams, MissingPricePolicy},
};

/// A value together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    /// The value; not yet checked for positivity.
    pub value: f64,
    /// Where it came from.
    pub source: Provenance,
}

/// The bucket whose window contains `baseline_date`.
pub fn baseline_bucket(
    buckets: &[Bucket],
    baseline_date: DateTime<Utc>,
    width: BucketWidth,
) -> Option<&Bucket> {
    let start = width.truncate(baseline_date);
    buckets.iter().find(|b| b.period_start == start)
}

/// The trading date with minimum absolute distance to `target`.
///
/// Dates are scanned in ascending order, so the earlier of two equidistant dates
/// wins.
pub fn closest_trading_day(buckets: &[Bucket], target: NaiveDate) -> Option<NaiveDate> {
    let mut dates: Vec<NaiveDate> = buckets.iter().map(Bucket::date).collect();
    dates.sort_unstable();
    dates.dedup();
    dates
        .into_iter()
        .min_by_key(|d| (*d - target).num_days().abs())
}

fn resolve_column(
    buckets: &[Bucket],
    baseline_date: DateTime<Utc>,
    width: BucketWidth,
    column: impl Fn(&Bucket) -> f64,
) -> Option<Resolved> {
    if let Some(b) = baseline_bucket(buckets, baseline_date, width) {
        let value = column(b);
        if value.is_finite() {
            return Some(Resolved {
                value,
                source: Provenance::Observed,
            });
        }
    }

    if let Some(day) = closest_trading_day(buckets, baseline_date.date_naive()) {
        let on_day: Vec<f64> = buckets
            .iter()
            .filter(|b| b.date() == day)
            .map(&column)
            .collect();
        if let Some(value) = fill::mean(&fill::nulled(&on_day)) {
            return Some(Resolved {
                value,
                source: Provenance::ClosestDay(day),
            });
        }
    }

    let whole: Vec<f64> = buckets.iter().map(&column).collect();
    fill::filled_mean(&whole).map(|value| Resolved {
        value,
        source: Provenance::Filled,
    })
}

/// Resolve the reference price from the product's own buckets.
pub fn resolve_price(
    buckets: &[Bucket],
    baseline_date: DateTime<Utc>,
    width: BucketWidth,
) -> Option<Resolved> {
    resolve_column(buckets, baseline_date, width, |b| b.avg_price)
}

/// Resolve the reference trade count from the product's own buckets.
pub fn resolve_volume(
    buckets: &[Bucket],
    baseline_date: DateTime<Utc>,
    width: BucketWidth,
) -> Option<Resolved> {
    resolve_column(buckets, baseline_date, width, |b| b.total_volume as f64)
}

/// Replace a missing or non-positive resolution with the sentinel.
fn or_sentinel(resolved: Option<Resolved>, sentinel: f64) -> Resolved {
    match resolved {
        Some(r) if r.value.is_finite() && r.value > 0.0 => r,
        _ => Resolved {
            value: sentinel,
            source: Provenance::Default,
        },
    }
}

fn log_entry(
    product_id: &str,
    baseline_date: DateTime<Utc>,
    column: LogColumn,
    original_value: Option<f64>,
    new_value: f64,
) -> InterpolationLogEntry {
    let method = match column {
        LogColumn::TotalVolume => RepairMethod::AdjustedVolume,
        _ => RepairMethod::AdjustedPrice,
    };
    InterpolationLogEntry {
        product_id: product_id.to_string(),
        date_created: baseline_date,
        column,
        method,
        original_value,
        new_value,
    }
}

/// Resolve the reference price and trade count a product is normalized against.
///
/// Price: the catalog's list price when it is finite and positive. Otherwise
/// [`IndexParams::missing_price`] decides between the sentinel and the resolver
/// chain (sentinel if that yields nothing usable), and one `adjusted_price` entry
/// is logged with the catalog value as the original.
///
/// Volume: the resolver chain, so the baseline bucket's count when there is one.
/// Filled or sentinel volumes log one `adjusted_volume` entry.
///
/// Never fails: worst case both values are the sentinel defaults from `params`.
pub fn resolve_baseline(
    product_id: &str,
    meta: Option<&ProductMeta>,
    buckets: &[Bucket],
    width: BucketWidth,
    params: &IndexParams,
    log: &InterpolationLog,
) -> Baseline {
    let price = match meta.and_then(ProductMeta::usable_price) {
        Some(value) => Resolved {
            value,
            source: Provenance::Catalog,
        },
        None => {
            let resolved = match params.missing_price {
                MissingPricePolicy::Sentinel => or_sentinel(None, params.default_baseline_price),
                MissingPricePolicy::ClosestTradingDay => or_sentinel(
                    resolve_price(buckets, params.baseline_date, width),
                    params.default_baseline_price,
                ),
            };
            log.record(log_entry(
                product_id,
                params.baseline_date,
                LogColumn::AvgPrice,
                meta.and_then(|m| m.original_price).filter(|p| p.is_finite()),
                resolved.value,
            ));
            resolved
        }
    };

    let raw_volume = resolve_volume(buckets, params.baseline_date, width);
    let volume = or_sentinel(raw_volume, params.default_baseline_volume);
    if volume.source.is_synthesized() {
        log.record(log_entry(
            product_id,
            params.baseline_date,
            LogColumn::TotalVolume,
            raw_volume.map(|r| r.value).filter(|v| v.is_finite()),
            volume.value,
        ));
    }

    Baseline {
        price: price.value,
        price_source: price.source,
        volume: volume.value,
        volume_source: volume.source,
    }
}
