//! Per-product index series.
//!
//! Steps for one product:
//! 1. keep its transactions at or after the baseline date
//! 2. group them into buckets (mean price, trade count)
//! 3. resolve the baseline with [`baseline::resolve_baseline`] (catalog price,
//!    else the missing-price policy; baseline bucket count, else the resolver chain)
//! 4. estimate the discount threshold from the raw transactions
//! 5. apply the configured formula per bucket
//! 6. null infinities and repair gaps, logging every changed value
//! 7. rescale so the baseline bucket is 100

use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    baseline,
    bucket::BucketWidth,
    fill,
    formula::FormulaInputs,
    log::{InterpolationLog, InterpolationLogEntry, LogColumn, RepairMethod},
    models::{Bucket, ProductMeta, ProductPoint, ProductSeries, Transaction},
    normalize,
    params::IndexParams,
    sources::ProductCatalog,
    threshold,
};

/// Value written into buckets that are still missing after gap repair.
pub const ALL_MISSING_FILL: f64 = 100.0;

/// Group transactions into buckets of `width`, in ascending time order.
pub fn bucketize<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    width: BucketWidth,
) -> Vec<Bucket> {
    let mut acc: BTreeMap<i64, (f64, u64)> = BTreeMap::new();
    for t in transactions {
        let slot = acc.entry(width.bucket_id(t.date_created)).or_insert((0.0, 0));
        slot.0 += t.price;
        slot.1 += 1;
    }
    acc.into_iter()
        .map(|(id, (sum, n))| Bucket {
            period_start: width.start_of(id),
            avg_price: sum / n as f64,
            total_volume: n,
        })
        .collect()
}

/// Compute one product's normalized series from the full transaction set.
///
/// An empty series (and no log entries) comes back when the product has no
/// transactions at or after the baseline date.
pub fn compute_product_series<C>(
    transactions: &[Transaction],
    catalog: &C,
    product_id: &str,
    width: BucketWidth,
    params: &IndexParams,
    log: &InterpolationLog,
) -> ProductSeries
where
    C: ProductCatalog + ?Sized,
{
    let own: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.product_id == product_id && t.date_created >= params.baseline_date)
        .collect();
    build_series(product_id, catalog.get(product_id), &own, width, params, log)
}

/// Series for transactions already filtered to one product and the baseline cut.
pub(crate) fn build_series(
    product_id: &str,
    meta: Option<&ProductMeta>,
    own: &[&Transaction],
    width: BucketWidth,
    params: &IndexParams,
    log: &InterpolationLog,
) -> ProductSeries {
    if own.is_empty() {
        debug!(product_id, %width, "no transactions at or after baseline");
        return ProductSeries::empty(product_id, width);
    }

    let buckets = bucketize(own.iter().copied(), width);
    let base = baseline::resolve_baseline(product_id, meta, &buckets, width, params, log);

    let discount_threshold = threshold::estimate_threshold(
        own.iter().copied(),
        base.price,
        params.discount_quantile,
        params.discount_default_threshold,
    );

    let raw: Vec<f64> = buckets
        .iter()
        .map(|b| {
            params.formula.apply(&FormulaInputs {
                avg_price: b.avg_price,
                total_volume: b.total_volume as f64,
                baseline_price: base.price,
                baseline_volume: base.volume,
                alpha: params.alpha,
                discount_threshold,
            })
        })
        .collect();

    let before = fill::nulled(&raw);
    let mut after = before.clone();
    fill::repair(&mut after);

    let mut entries: Vec<InterpolationLogEntry> = Vec::new();
    let mut index = Vec::with_capacity(buckets.len());
    for ((bucket, old), new) in buckets.iter().zip(&before).zip(&after) {
        let value = new.unwrap_or(ALL_MISSING_FILL);
        if *old != Some(value) {
            entries.push(InterpolationLogEntry {
                product_id: product_id.to_string(),
                date_created: bucket.period_start,
                column: LogColumn::ResellIndex,
                method: RepairMethod::Interpolation,
                original_value: *old,
                new_value: value,
            });
        }
        index.push(value);
    }

    let starts: Vec<_> = buckets.iter().map(|b| b.period_start).collect();
    normalize::rebase_to_100(&starts, &mut index, width.truncate(params.baseline_date));

    debug!(
        product_id,
        %width,
        buckets = buckets.len(),
        baseline_price = base.price,
        baseline_volume = base.volume,
        discount_threshold,
        repaired = entries.len(),
        "computed product series"
    );
    log.extend(entries);

    let points = buckets
        .into_iter()
        .zip(index)
        .map(|(b, resell_index)| ProductPoint {
            normalized_premium: (b.avg_price - base.price) / base.price * 100.0,
            period_start: b.period_start,
            avg_price: b.avg_price,
            total_volume: b.total_volume,
            resell_index,
        })
        .collect();

    ProductSeries {
        product_id: product_id.to_string(),
        name: meta.map(|m| m.name.clone()),
        width,
        baseline: Some(base),
        discount_threshold: Some(discount_threshold),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        baseline::resolve_baseline, formula::FormulaKind, models::Provenance,
        params::MissingPricePolicy, sources::Catalog,
    };
    use chrono::{DateTime, TimeZone, Utc};

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, d, h, 0, 0).unwrap()
    }

    fn catalog(price: Option<f64>) -> Catalog {
        [ProductMeta {
            product_id: "p".into(),
            original_price: price,
            name: "Plush".into(),
        }]
        .into_iter()
        .collect()
    }

    #[test]
    fn bucketize_means_and_counts() {
        let txs = vec![
            Transaction::new("p", 10.0, at(1, 1)),
            Transaction::new("p", 20.0, at(1, 23)),
            Transaction::new("p", 40.0, at(2, 0)),
        ];
        let b = bucketize(&txs, BucketWidth::Daily);
        assert_eq!(b.len(), 2);
        assert_eq!((b[0].avg_price, b[0].total_volume), (15.0, 2));
        assert_eq!(b[1].period_start, at(2, 0));

        let fine = bucketize(&txs, BucketWidth::FourHour);
        assert_eq!(fine.len(), 3);
        assert_eq!(fine[1].period_start, at(1, 20));
    }

    #[test]
    fn transactions_before_baseline_are_ignored() {
        let txs = vec![Transaction::new("p", 10.0, at(1, 0))];
        let params = IndexParams::new(at(2, 0));
        let log = InterpolationLog::new();
        let cat = catalog(Some(10.0));
        let s = compute_product_series(&txs, &cat, "p", BucketWidth::Daily, &params, &log);
        assert!(s.is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn baseline_bucket_is_100_and_premium_follows_price() {
        let txs = vec![
            Transaction::new("p", 100.0, at(1, 3)),
            Transaction::new("p", 150.0, at(2, 3)),
        ];
        let params = IndexParams::new(at(1, 0)).with_formula(FormulaKind::Plain);
        let log = InterpolationLog::new();
        let cat = catalog(Some(100.0));
        let s = compute_product_series(&txs, &cat, "p", BucketWidth::Daily, &params, &log);
        assert_eq!(s.points[0].resell_index, 100.0);
        assert_eq!(s.points[1].resell_index, 150.0);
        assert_eq!(s.points[1].normalized_premium, 50.0);
        assert_eq!(s.name.as_deref(), Some("Plush"));
        assert!(log.is_empty());
    }

    #[test]
    fn closest_trading_day_policy_uses_own_prices() {
        let txs = vec![Transaction::new("p", 40.0, at(3, 0))];
        let mut params = IndexParams::new(at(1, 0));
        params.missing_price = MissingPricePolicy::ClosestTradingDay;
        let log = InterpolationLog::new();
        let cat = catalog(None);
        let s = compute_product_series(&txs, &cat, "p", BucketWidth::Daily, &params, &log);
        let base = s.baseline.unwrap();
        assert_eq!(base.price, 40.0);
        assert!(matches!(base.price_source, Provenance::ClosestDay(_)));

        let price_entries: Vec<_> = log
            .snapshot()
            .into_iter()
            .filter(|e| e.method == RepairMethod::AdjustedPrice)
            .collect();
        assert_eq!(price_entries.len(), 1);
        assert_eq!(price_entries[0].new_value, 40.0);
    }

    #[test]
    fn zero_baseline_price_never_leaks_infinity() {
        // sentinel price 10, product list price unusable
        let txs = vec![
            Transaction::new("p", 5.0, at(1, 0)),
            Transaction::new("p", 0.0, at(2, 0)),
        ];
        let params = IndexParams::new(at(1, 0));
        let log = InterpolationLog::new();
        let cat = catalog(Some(0.0));
        let s = compute_product_series(&txs, &cat, "p", BucketWidth::Daily, &params, &log);
        assert!(s.points.iter().all(|p| p.resell_index.is_finite()));
        assert_eq!(log.snapshot()[0].original_value, Some(0.0));
    }

    #[test]
    fn series_baseline_and_log_come_from_the_resolver() {
        let txs = vec![
            Transaction::new("p", 30.0, at(3, 0)),
            Transaction::new("p", 50.0, at(4, 0)),
        ];
        let mut params = IndexParams::new(at(1, 0));
        params.missing_price = MissingPricePolicy::ClosestTradingDay;
        let cat = catalog(None);

        let series_log = InterpolationLog::new();
        let s = compute_product_series(&txs, &cat, "p", BucketWidth::Daily, &params, &series_log);

        let resolver_log = InterpolationLog::new();
        let buckets = bucketize(&txs, BucketWidth::Daily);
        let base = resolve_baseline(
            "p",
            cat.get("p"),
            &buckets,
            BucketWidth::Daily,
            &params,
            &resolver_log,
        );

        assert_eq!(s.baseline, Some(base));
        assert_eq!(base.price, 30.0);
        // no gaps to repair, so the resolver's entries are the whole log
        assert_eq!(series_log.snapshot(), resolver_log.snapshot());
    }
}
