//! Cross-product market index.
//!
//! - Transactions are grouped by product once per run, then each requested
//!   product goes through [`crate::product`] (optionally on the rayon pool).
//! - Empty product series are skipped and listed in [`MarketSeries::skipped`].
//! - Each bucket's value is the mean `resell_index` of the products observed in it.
//! - Dense widths (4-hour) are resampled onto the full grid; empty buckets are 0.
//! - The result is rescaled to 100 at the baseline bucket and sorted by time.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    bucket::BucketWidth,
    log::InterpolationLog,
    models::{MarketPoint, MarketSeries, ProductId, ProductSeries, Transaction},
    normalize,
    params::IndexParams,
    product::build_series,
    sources::ProductCatalog,
};

/// A market series together with the product series that fed it.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketRun {
    /// The market index.
    pub market: MarketSeries,
    /// Every requested product's series (empty ones included), in request order.
    pub products: IndexMap<ProductId, ProductSeries>,
}

fn group_by_product<'a>(
    transactions: &'a [Transaction],
    baseline_date: DateTime<Utc>,
) -> HashMap<&'a str, Vec<&'a Transaction>> {
    let mut groups: HashMap<&str, Vec<&Transaction>> = HashMap::new();
    for t in transactions.iter().filter(|t| t.date_created >= baseline_date) {
        groups.entry(t.product_id.as_str()).or_default().push(t);
    }
    groups
}

/// Run the per-product aggregator over `product_ids` and combine the results.
///
/// Duplicate ids are computed once. Never fails; when every product is empty the
/// market series is empty and a warning is emitted.
pub fn compute_market_run<C>(
    transactions: &[Transaction],
    catalog: &C,
    product_ids: &[ProductId],
    width: BucketWidth,
    params: &IndexParams,
    log: &InterpolationLog,
) -> MarketRun
where
    C: ProductCatalog + Sync + ?Sized,
{
    let groups = group_by_product(transactions, params.baseline_date);
    let ids: Vec<&str> = product_ids
        .iter()
        .map(String::as_str)
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect();

    let compute = |id: &str| {
        let own = groups.get(id).map(Vec::as_slice).unwrap_or(&[]);
        build_series(id, catalog.get(id), own, width, params, log)
    };
    let series: Vec<ProductSeries> = if params.parallel {
        ids.par_iter().map(|&id| compute(id)).collect()
    } else {
        ids.iter().map(|&id| compute(id)).collect()
    };

    let mut market = MarketSeries::empty(width);
    for s in &series {
        if s.is_empty() {
            debug!(product_id = %s.product_id, %width, "skipping product with empty series");
            market.skipped.push(s.product_id.clone());
        } else {
            market.contributors.push(s.product_id.clone());
        }
    }

    market.points = combine(&series, width, params.baseline_date);
    if market.is_empty() {
        warn!(
            %width,
            requested = ids.len(),
            "every product series is empty; market series is empty"
        );
    } else {
        info!(
            %width,
            contributors = market.contributors.len(),
            skipped = market.skipped.len(),
            buckets = market.points.len(),
            "computed market series"
        );
    }

    let products = series
        .into_iter()
        .map(|s| (s.product_id.clone(), s))
        .collect();
    MarketRun { market, products }
}

/// Market series only; see [`compute_market_run`].
pub fn compute_market_series<C>(
    transactions: &[Transaction],
    catalog: &C,
    product_ids: &[ProductId],
    width: BucketWidth,
    params: &IndexParams,
    log: &InterpolationLog,
) -> MarketSeries
where
    C: ProductCatalog + Sync + ?Sized,
{
    compute_market_run(transactions, catalog, product_ids, width, params, log).market
}

fn combine(
    series: &[ProductSeries],
    width: BucketWidth,
    baseline_date: DateTime<Utc>,
) -> Vec<MarketPoint> {
    let mut acc: BTreeMap<DateTime<Utc>, (f64, usize)> = BTreeMap::new();
    for p in series.iter().flat_map(|s| &s.points) {
        let slot = acc.entry(p.period_start).or_insert((0.0, 0));
        slot.0 += p.resell_index;
        slot.1 += 1;
    }
    let (Some(&first), Some(&last)) = (acc.keys().next(), acc.keys().next_back()) else {
        return Vec::new();
    };

    let mut points: Vec<MarketPoint> = if width.dense_market_grid() {
        width
            .grid(first, last)
            .map(|start| match acc.get(&start) {
                Some(&(sum, n)) => point(start, sum, n),
                None => MarketPoint {
                    period_start: start,
                    market_resell_index: 0.0,
                    contributors: 0,
                },
            })
            .collect()
    } else {
        acc.into_iter().map(|(start, (sum, n))| point(start, sum, n)).collect()
    };

    let starts: Vec<_> = points.iter().map(|p| p.period_start).collect();
    let mut values: Vec<f64> = points.iter().map(|p| p.market_resell_index).collect();
    normalize::rebase_to_100(&starts, &mut values, width.truncate(baseline_date));
    for (p, v) in points.iter_mut().zip(values) {
        p.market_resell_index = v;
    }
    points
}

fn point(period_start: DateTime<Utc>, sum: f64, n: usize) -> MarketPoint {
    MarketPoint {
        period_start,
        market_resell_index: sum / n as f64,
        contributors: n,
    }
}

/// Label a sweep series is emitted under.
pub fn sweep_label(alpha: f64) -> String {
    format!("alpha={alpha}")
}

/// One market series per alpha, in the order given.
///
/// Every run appends to the same `log`.
pub fn compute_alpha_sweep<C>(
    transactions: &[Transaction],
    catalog: &C,
    product_ids: &[ProductId],
    width: BucketWidth,
    params: &IndexParams,
    alphas: &[f64],
    log: &InterpolationLog,
) -> Vec<(f64, MarketSeries)>
where
    C: ProductCatalog + Sync + ?Sized,
{
    alphas
        .iter()
        .map(|&alpha| {
            let p = params.clone().with_alpha(alpha);
            let series = compute_market_series(transactions, catalog, product_ids, width, &p, log);
            (alpha, series)
        })
        .collect()
}

/// The `n` products with the most trades in the baseline bucket.
///
/// Ties go to the smaller product id. Products without a baseline bucket are not
/// eligible.
pub fn select_constituents(
    run: &MarketRun,
    baseline_date: DateTime<Utc>,
    n: usize,
) -> Vec<ProductId> {
    let start = run.market.width.truncate(baseline_date);
    let mut ranked: Vec<(&ProductId, u64)> = run
        .products
        .iter()
        .filter_map(|(id, s)| s.point_at(start).map(|p| (id, p.total_volume)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(n).map(|(id, _)| id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{formula::FormulaKind, models::ProductMeta, sources::Catalog};
    use chrono::TimeZone;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, d, h, 0, 0).unwrap()
    }

    fn catalog() -> Catalog {
        ["a", "b", "c"]
            .into_iter()
            .map(|id| ProductMeta {
                product_id: id.into(),
                original_price: Some(100.0),
                name: id.to_uppercase(),
            })
            .collect()
    }

    fn ids(v: &[&str]) -> Vec<ProductId> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn mean_per_bucket_and_renormalized() {
        let txs = vec![
            Transaction::new("a", 100.0, at(1, 0)),
            Transaction::new("b", 100.0, at(1, 0)),
            Transaction::new("a", 200.0, at(2, 0)),
            Transaction::new("b", 100.0, at(2, 0)),
        ];
        let params = IndexParams::new(at(1, 0)).with_formula(FormulaKind::Plain);
        let log = InterpolationLog::new();
        let ab = ids(&["a", "b"]);
        let m = compute_market_series(&txs, &catalog(), &ab, BucketWidth::Daily, &params, &log);
        assert_eq!(m.points.len(), 2);
        assert_eq!(m.points[0].market_resell_index, 100.0);
        assert_eq!(m.points[1].market_resell_index, 150.0);
        assert_eq!(m.points[1].contributors, 2);
    }

    #[test]
    fn dense_grid_fills_zero() {
        let txs = vec![
            Transaction::new("a", 100.0, at(1, 0)),
            Transaction::new("a", 100.0, at(1, 12)),
        ];
        let params = IndexParams::new(at(1, 0)).with_formula(FormulaKind::Plain);
        let log = InterpolationLog::new();
        let a = ids(&["a"]);
        let m = compute_market_series(&txs, &catalog(), &a, BucketWidth::FourHour, &params, &log);
        assert_eq!(m.points.len(), 4);
        assert_eq!(m.points[1].market_resell_index, 0.0);
        assert_eq!(m.points[1].contributors, 0);
        assert_eq!(m.points[3].market_resell_index, 100.0);
    }

    #[test]
    fn parallel_matches_sequential() {
        let txs: Vec<Transaction> = (0..30)
            .map(|i| {
                let id = ["a", "b", "c"][i % 3];
                Transaction::new(id, 80.0 + i as f64, at(1 + (i % 5) as u32, (i % 24) as u32))
            })
            .collect();
        let mut params = IndexParams::new(at(1, 0));
        let ids = ids(&["a", "b", "c"]);

        let seq_log = InterpolationLog::new();
        let seq = compute_market_run(&txs, &catalog(), &ids, BucketWidth::Daily, &params, &seq_log);
        params.parallel = true;
        let par_log = InterpolationLog::new();
        let par = compute_market_run(&txs, &catalog(), &ids, BucketWidth::Daily, &params, &par_log);

        assert_eq!(seq, par);
        assert_eq!(seq_log.len(), par_log.len());
    }

    #[test]
    fn duplicate_ids_computed_once() {
        let txs = vec![Transaction::new("a", 100.0, at(1, 0))];
        let params = IndexParams::new(at(1, 0));
        let log = InterpolationLog::new();
        let aa = ids(&["a", "a"]);
        let run = compute_market_run(&txs, &catalog(), &aa, BucketWidth::Daily, &params, &log);
        assert_eq!(run.products.len(), 1);
        assert_eq!(run.market.contributors, ids(&["a"]));
    }

    #[test]
    fn constituents_ranked_by_baseline_volume_then_id() {
        let mut txs = vec![
            Transaction::new("a", 100.0, at(1, 1)),
            Transaction::new("b", 100.0, at(1, 1)),
            Transaction::new("b", 100.0, at(1, 2)),
            Transaction::new("c", 100.0, at(1, 3)),
        ];
        // only trades after the baseline day; not eligible
        txs.push(Transaction::new("d", 100.0, at(2, 0)));
        let params = IndexParams::new(at(1, 0));
        let log = InterpolationLog::new();
        let run = compute_market_run(
            &txs,
            &catalog(),
            &ids(&["c", "a", "b", "d"]),
            BucketWidth::Daily,
            &params,
            &log,
        );
        assert_eq!(select_constituents(&run, at(1, 0), 2), ids(&["b", "a"]));
        assert_eq!(select_constituents(&run, at(1, 0), 10).len(), 3);
    }

    #[test]
    fn sweep_labels_and_order() {
        let txs = vec![Transaction::new("a", 120.0, at(1, 0))];
        let params = IndexParams::new(at(1, 0));
        let log = InterpolationLog::new();
        let sweep = compute_alpha_sweep(
            &txs,
            &catalog(),
            &ids(&["a"]),
            BucketWidth::Daily,
            &params,
            &[0.0, 0.5],
            &log,
        );
        assert_eq!(sweep.len(), 2);
        assert_eq!(sweep[1].0, 0.5);
        assert_eq!(sweep_label(sweep[1].0), "alpha=0.5");
        assert_eq!(sweep_label(0.1), "alpha=0.1");
    }
}
