//! Two-pass market index pipeline.
//!
//! 1. Daily pass over every catalog product.
//! 2. Pick the constituents: the products with the most trades in the baseline bucket.
//! 3. 4-hour pass over the constituents only.
//! 4. Optional daily alpha sweep over every catalog product.
//! 5. Emit every series and flush the interpolation log to the sink.

use anyhow::Context;
use resell_core::{
    BucketWidth, InterpolationLog, ProductCatalog, ResultSink, TransactionSource,
    compute_alpha_sweep, compute_market_run, compute_market_series, select_constituents,
    sweep_label,
};
use serde::Serialize;
use tracing::info;

use crate::config::AppConfig;

/// Label of the daily market series.
pub const DAILY_LABEL: &str = "resell_index_24h";
/// Label of the 4-hour market series.
pub const FOUR_HOUR_LABEL: &str = "resell_index_4h";

/// What one pipeline run did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    /// Transactions read from the source.
    pub transactions: usize,
    /// Products listed in the catalog.
    pub products_considered: usize,
    /// Products that contributed to the daily series.
    pub daily_contributors: usize,
    /// Buckets in the daily series.
    pub daily_buckets: usize,
    /// Products chosen for the 4-hour pass.
    pub constituents: Vec<String>,
    /// Products that contributed to the 4-hour series.
    pub four_hour_contributors: usize,
    /// Buckets in the 4-hour series.
    pub four_hour_buckets: usize,
    /// Labels of the alpha sweep series that were emitted.
    pub sweep_labels: Vec<String>,
    /// Interpolation log entries flushed to the sink.
    pub log_entries: usize,
}

impl PipelineReport {
    /// True when the daily market series has no buckets.
    pub fn is_empty(&self) -> bool {
        self.daily_buckets == 0
    }
}

/// Run the full pipeline against the given collaborators.
///
/// An empty market is not an error here; check [`PipelineReport::is_empty`].
pub fn run_pipeline<S, C, K>(
    source: &S,
    catalog: &C,
    sink: &mut K,
    config: &AppConfig,
) -> anyhow::Result<PipelineReport>
where
    S: TransactionSource,
    C: ProductCatalog + Sync,
    K: ResultSink,
{
    let params = &config.index;
    let transactions = source.fetch_all().context("failed to read transactions")?;
    let product_ids = catalog.product_ids();
    info!(
        transactions = transactions.len(),
        products = product_ids.len(),
        baseline = %params.baseline_date,
        "starting pipeline"
    );

    let log = InterpolationLog::new();

    let daily = compute_market_run(
        &transactions,
        catalog,
        &product_ids,
        BucketWidth::Daily,
        params,
        &log,
    );
    sink.emit_series(&daily.market, DAILY_LABEL)
        .context("failed to emit daily series")?;

    let constituents =
        select_constituents(&daily, params.baseline_date, config.pipeline.constituents);
    info!(selected = constituents.len(), "selected constituents for the 4h pass");
    let fine = compute_market_series(
        &transactions,
        catalog,
        &constituents,
        BucketWidth::FourHour,
        params,
        &log,
    );
    sink.emit_series(&fine, FOUR_HOUR_LABEL)
        .context("failed to emit 4h series")?;

    let mut sweep_labels = Vec::new();
    let sweep = compute_alpha_sweep(
        &transactions,
        catalog,
        &product_ids,
        BucketWidth::Daily,
        params,
        &config.pipeline.alphas,
        &log,
    );
    for (alpha, series) in &sweep {
        let label = sweep_label(*alpha);
        sink.emit_series(series, &label)
            .with_context(|| format!("failed to emit {label}"))?;
        sweep_labels.push(label);
    }

    let entries = log.drain();
    sink.emit_log(&entries).context("failed to emit interpolation log")?;
    info!(entries = entries.len(), "flushed interpolation log");

    Ok(PipelineReport {
        transactions: transactions.len(),
        products_considered: product_ids.len(),
        daily_contributors: daily.market.contributors.len(),
        daily_buckets: daily.market.points.len(),
        constituents,
        four_hour_contributors: fine.contributors.len(),
        four_hour_buckets: fine.points.len(),
        sweep_labels,
        log_entries: entries.len(),
    })
}
