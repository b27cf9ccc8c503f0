//! In-memory data model shared by every stage of the index pipeline.
//!
//! Inputs:
//! - [`Transaction`]: one resale record from the transaction source
//! - [`ProductMeta`]: catalog metadata for one product
//!
//! Derived:
//! - [`Bucket`]: one product's transactions grouped into a time window
//! - [`ProductSeries`] / [`ProductPoint`]: normalized per-product index
//! - [`MarketSeries`] / [`MarketPoint`]: cross-product market index

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::bucket::BucketWidth;

/// Product identifier as supplied by the catalog and the transaction source.
pub type ProductId = String;

/// A single resale transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Product this sale belongs to.
    pub product_id: ProductId,
    /// Sale price.
    pub price: f64,
    /// When the sale happened (UTC).
    pub date_created: DateTime<Utc>,
}

impl Transaction {
    /// Convenience constructor.
    pub fn new(product_id: impl Into<ProductId>, price: f64, date_created: DateTime<Utc>) -> Self {
        Self {
            product_id: product_id.into(),
            price,
            date_created,
        }
    }
}

/// Catalog metadata for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMeta {
    /// Product identifier.
    pub product_id: ProductId,
    /// Original list price. `None` or a non-positive value means "unknown".
    pub original_price: Option<f64>,
    /// Human-readable product name.
    pub name: String,
}

impl ProductMeta {
    /// The list price if it is usable as a baseline (finite and positive).
    pub fn usable_price(&self) -> Option<f64> {
        self.original_price.filter(|p| p.is_finite() && *p > 0.0)
    }
}

/// One product's transactions aggregated over a time window.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    /// Inclusive window start (UTC).
    pub period_start: DateTime<Utc>,
    /// Mean sale price in the window.
    pub avg_price: f64,
    /// Number of sales in the window (trade count, not quantity).
    pub total_volume: u64,
}

impl Bucket {
    /// UTC calendar date of the window start.
    pub fn date(&self) -> NaiveDate {
        self.period_start.date_naive()
    }
}

/// Where a baseline value came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Taken from the product catalog.
    Catalog,
    /// Observed in the bucket at the baseline date.
    Observed,
    /// Observed on the trading day closest to the baseline date.
    ClosestDay(NaiveDate),
    /// Derived from the fill/interpolation chain over the whole series.
    Filled,
    /// Sentinel default substituted because nothing usable was found.
    Default,
}

impl Provenance {
    /// True when the value was synthesized rather than observed.
    pub fn is_synthesized(self) -> bool {
        matches!(self, Provenance::Filled | Provenance::Default)
    }
}

/// The reference price and volume a product's index is normalized against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Reference price; always finite and positive.
    pub price: f64,
    /// Where `price` came from.
    pub price_source: Provenance,
    /// Reference trade count; always finite and positive.
    pub volume: f64,
    /// Where `volume` came from.
    pub volume_source: Provenance,
}

/// One bucket of a product's index series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPoint {
    /// Inclusive window start (UTC).
    pub period_start: DateTime<Utc>,
    /// Mean sale price in the window.
    pub avg_price: f64,
    /// Number of sales in the window.
    pub total_volume: u64,
    /// Index value, rescaled so the baseline bucket is 100.
    pub resell_index: f64,
    /// Premium over the baseline price, in percent of the baseline price.
    pub normalized_premium: f64,
}

/// A product's normalized index series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSeries {
    /// Product identifier.
    pub product_id: ProductId,
    /// Product name from the catalog, if the product is listed.
    pub name: Option<String>,
    /// Bucket width the series was computed at.
    pub width: BucketWidth,
    /// Baseline used for the formula; `None` for an empty series.
    pub baseline: Option<Baseline>,
    /// Minimum daily trade count for a discount to move the index.
    pub discount_threshold: Option<f64>,
    /// Buckets in ascending time order.
    pub points: Vec<ProductPoint>,
}

impl ProductSeries {
    /// An empty series for a product with no trades at or after the baseline.
    pub fn empty(product_id: impl Into<ProductId>, width: BucketWidth) -> Self {
        Self {
            product_id: product_id.into(),
            name: None,
            width,
            baseline: None,
            discount_threshold: None,
            points: Vec::new(),
        }
    }

    /// True when the series has no buckets.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The point whose window starts at `period_start`.
    pub fn point_at(&self, period_start: DateTime<Utc>) -> Option<&ProductPoint> {
        self.points.iter().find(|p| p.period_start == period_start)
    }
}

/// One bucket of the market index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPoint {
    /// Inclusive window start (UTC).
    pub period_start: DateTime<Utc>,
    /// Mean of the contributing products' index values, rescaled to 100 at baseline.
    pub market_resell_index: f64,
    /// Number of products with a bucket in this window (0 for grid fill).
    pub contributors: usize,
}

/// The cross-product market index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSeries {
    /// Bucket width the series was computed at.
    pub width: BucketWidth,
    /// Buckets in ascending time order.
    pub points: Vec<MarketPoint>,
    /// Products whose series fed the index, in request order.
    pub contributors: Vec<ProductId>,
    /// Products skipped because their series was empty, in request order.
    pub skipped: Vec<ProductId>,
}

impl MarketSeries {
    /// An empty market series.
    pub fn empty(width: BucketWidth) -> Self {
        Self {
            width,
            points: Vec::new(),
            contributors: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// True when no bucket was produced.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The point whose window starts at `period_start`.
    pub fn point_at(&self, period_start: DateTime<Utc>) -> Option<&MarketPoint> {
        self.points.iter().find(|p| p.period_start == period_start)
    }
}
